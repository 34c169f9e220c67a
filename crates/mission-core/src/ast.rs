//! The parsed script AST (§3.1, §4.B). A `Program` is a flat list of
//! top-level `Block`s; the evaluator walks every block to quiescence each
//! tick.

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub blocks: Vec<Block>,
}

/// A top-level `if (...) ... else ... endif`-shaped unit, re-evaluated
/// from its condition every tick it is live. Unlike the nested
/// `Stmt::Block`, a top-level block has no enclosing statement list: it is
/// always re-entered from the top on the next tick (§3.1, §4.D).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub else_body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A nested `if (cond) ... else ... endif` inside a block body.
    Block(Block),
    /// `var = expr`
    Assign { slot: VarRef, value: Expr },
    /// A bare dispatch call used for its side effect, result discarded.
    Call(Call),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Int,
    Obj,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub kind: VarKind,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Sign-extended numeric literal (§3.1 `Literal(int32)`).
    IntLit(i32),
    /// `TRUE`/`FALSE`; encodes to 1/0 when used as an int (§3.1 `Bool`).
    BoolLit(bool),
    /// Resolves through the host's string table to a type name (§3.1,
    /// §4.H); carried as the raw table index until a handler needs the
    /// text.
    StringRef(u32),
    Var(VarRef),
    /// Returns int or pos; the evaluator passes the result through
    /// without coercion until it is consumed (§3.1, §4.D).
    Call(Call),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    And,
    Or,
    Add,
    Sub,
}

/// A call to a host function, by its numeric id (§4.B, §6.2). `args` are
/// positional expressions; the dispatch table decides how many it
/// consumes and whether any of them are out-var lvalues (a `VarRef` read
/// directly off the argument list rather than evaluated) per §4.E group
/// 14.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func_id: u16,
    pub args: Vec<Expr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_carries_its_own_else_body() {
        let block = Block {
            condition: Expr::BoolLit(true),
            body: vec![Stmt::Call(Call {
                func_id: 1,
                args: vec![],
            })],
            else_body: vec![],
        };
        assert_eq!(block.body.len(), 1);
        assert!(block.else_body.is_empty());
    }

    #[test]
    fn var_ref_is_hashable_for_use_as_a_map_key() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(VarRef {
            kind: VarKind::Int,
            index: 3,
        });
        assert!(set.contains(&VarRef {
            kind: VarKind::Int,
            index: 3,
        }));
    }
}
