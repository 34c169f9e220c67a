//! Recursive-descent parser turning a lowered token stream into a
//! `Program` AST (§4.B "AST construction").
//!
//! Variable declarations (`int(slot)`, `obj(slot)`, `pos(slot)`) run at
//! program start and register each slot's `VarKind`; every later `Var`
//! token is just a bare slot number until resolved against that map. A
//! `Block` begins on `Keyword(if)`, parses an optionally paren-wrapped
//! condition, then statements until `Keyword(else)` or `Keyword(endif)`;
//! there is no `begin` keyword in this dialect — a body simply runs until
//! its terminator.

use std::collections::HashMap;

use crate::ast::{BinOp, Block, Call, Expr, Program, Stmt, VarKind, VarRef};
use crate::decoder::tables::{
    KW_AND, KW_ASSIGN, KW_ELSE, KW_ENDIF, KW_EQ, KW_FALSE, KW_GE, KW_GT, KW_IF, KW_INT, KW_LE,
    KW_LT, KW_MINUS, KW_NE, KW_OBJ, KW_OR, KW_PLUS, KW_POS, KW_TRUE,
};
use crate::decoder::tokens::Token;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of token stream, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("expected {expected}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: Token,
    },
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    slot_kinds: HashMap<u32, VarKind>,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            slot_kinds: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_keyword(&self, id: u16) -> bool {
        matches!(self.peek(), Some(Token::Keyword(k)) if *k == id)
    }

    fn eat_keyword(&mut self, id: u16) -> bool {
        if self.at_keyword(id) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, id: u16, label: &'static str) -> Result<(), ParseError> {
        if self.eat_keyword(id) {
            Ok(())
        } else {
            self.error(label)
        }
    }

    fn error<T>(&self, label: &'static str) -> Result<T, ParseError> {
        match self.peek() {
            Some(tok) => Err(ParseError::Unexpected {
                expected: label,
                found: tok.clone(),
            }),
            None => Err(ParseError::UnexpectedEof(label)),
        }
    }

    fn at_ascii(&self, byte: u8) -> bool {
        matches!(self.peek(), Some(Token::Ascii(b)) if *b == byte)
    }

    fn eat_ascii(&mut self, byte: u8) -> bool {
        if self.at_ascii(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ascii(&mut self, byte: u8, label: &'static str) -> Result<(), ParseError> {
        if self.eat_ascii(byte) {
            Ok(())
        } else {
            self.error(label)
        }
    }

    /// Skips a trailing statement terminator if present. Some segments'
    /// lowering never produces one (e.g. a segment ending exactly on a
    /// keyword), so this is tolerant rather than required.
    fn skip_semicolons(&mut self) {
        while self.eat_ascii(b';') {}
    }

    fn resolve_var(&mut self, slot: u32) -> VarRef {
        let kind = self.slot_kinds.get(&slot).copied().unwrap_or(VarKind::Int);
        VarRef { kind, index: slot }
    }
}

pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut cursor = Cursor::new(tokens);
    parse_slot_decls(&mut cursor)?;

    let mut blocks = Vec::new();
    cursor.skip_semicolons();
    while cursor.peek().is_some() {
        blocks.push(parse_block(&mut cursor)?);
        cursor.skip_semicolons();
    }
    Ok(Program { blocks })
}

fn parse_slot_decls(cursor: &mut Cursor) -> Result<(), ParseError> {
    loop {
        cursor.skip_semicolons();
        let kind = if cursor.at_keyword(KW_INT) {
            VarKind::Int
        } else if cursor.at_keyword(KW_OBJ) {
            VarKind::Obj
        } else if cursor.at_keyword(KW_POS) {
            VarKind::Pos
        } else {
            return Ok(());
        };
        cursor.next();
        cursor.expect_ascii(b'(', "(")?;
        let slot = match cursor.next() {
            Some(Token::Var(slot)) => slot,
            Some(tok) => {
                return Err(ParseError::Unexpected {
                    expected: "declared variable slot",
                    found: tok,
                })
            }
            None => return Err(ParseError::UnexpectedEof("declared variable slot")),
        };
        cursor.expect_ascii(b')', ")")?;
        cursor.skip_semicolons();
        cursor.slot_kinds.insert(slot, kind);
    }
}

fn parse_block(cursor: &mut Cursor) -> Result<Block, ParseError> {
    cursor.expect_keyword(KW_IF, "if")?;
    let had_paren = cursor.eat_ascii(b'(');
    let condition = parse_expr(cursor)?;
    if had_paren {
        cursor.expect_ascii(b')', ")")?;
    }
    let body = parse_stmts_until_terminator(cursor)?;
    let else_body = if cursor.eat_keyword(KW_ELSE) {
        parse_stmts_until_terminator(cursor)?
    } else {
        Vec::new()
    };
    cursor.expect_keyword(KW_ENDIF, "endif")?;
    Ok(Block {
        condition,
        body,
        else_body,
    })
}

fn at_terminator(cursor: &Cursor) -> bool {
    cursor.at_keyword(KW_ELSE) || cursor.at_keyword(KW_ENDIF)
}

fn parse_stmts_until_terminator(cursor: &mut Cursor) -> Result<Vec<Stmt>, ParseError> {
    let mut stmts = Vec::new();
    cursor.skip_semicolons();
    while !at_terminator(cursor) {
        if cursor.peek().is_none() {
            return Err(ParseError::UnexpectedEof("else/endif"));
        }
        stmts.push(parse_stmt(cursor)?);
        cursor.skip_semicolons();
    }
    Ok(stmts)
}

fn parse_stmt(cursor: &mut Cursor) -> Result<Stmt, ParseError> {
    if cursor.at_keyword(KW_IF) {
        return Ok(Stmt::Block(parse_block(cursor)?));
    }

    // An accumulator artifact: a lone reference to slot 0 followed by a
    // meaningful token (not itself part of an assignment) is skipped
    // (§4.B "Call" parsing note).
    if let Some(Token::Var(0)) = cursor.peek() {
        let next_is_assign = matches!(cursor.peek_at(1), Some(Token::Keyword(k)) if *k == KW_ASSIGN);
        if !next_is_assign {
            cursor.next();
        }
    }

    if let Some(Token::Var(slot)) = cursor.peek().copied() {
        if matches!(cursor.peek_at(1), Some(Token::Keyword(k)) if *k == KW_ASSIGN) {
            cursor.next();
            cursor.next();
            let value = parse_expr(cursor)?;
            let slot = cursor.resolve_var(slot);
            return Ok(Stmt::Assign { slot, value });
        }
    }

    let call = parse_call(cursor)?;
    Ok(Stmt::Call(call))
}

fn parse_call(cursor: &mut Cursor) -> Result<Call, ParseError> {
    let func_id = match cursor.next() {
        Some(Token::Func(id)) => id,
        Some(tok) => {
            return Err(ParseError::Unexpected {
                expected: "function call",
                found: tok,
            })
        }
        None => return Err(ParseError::UnexpectedEof("function call")),
    };
    cursor.expect_ascii(b'(', "(")?;
    let mut args = Vec::new();
    if !cursor.at_ascii(b')') {
        loop {
            // Accumulator artifact inside an argument list.
            if let Some(Token::Var(0)) = cursor.peek() {
                if !matches!(cursor.peek_at(1), Some(Token::Ascii(b)) if *b == b',' || *b == b')')
                {
                    cursor.next();
                }
            }
            args.push(parse_expr(cursor)?);
            if !cursor.eat_ascii(b',') {
                break;
            }
        }
    }
    cursor.expect_ascii(b')', ")")?;
    Ok(Call { func_id, args })
}

fn parse_expr(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    parse_or(cursor)
}

fn parse_or(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_and(cursor)?;
    while cursor.eat_keyword(KW_OR) {
        let rhs = parse_and(cursor)?;
        lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_and(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_eq(cursor)?;
    while cursor.eat_keyword(KW_AND) {
        let rhs = parse_eq(cursor)?;
        lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_eq(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_rel(cursor)?;
    loop {
        let op = if cursor.eat_keyword(KW_EQ) {
            BinOp::Eq
        } else if cursor.eat_keyword(KW_NE) {
            BinOp::Ne
        } else {
            break;
        };
        let rhs = parse_rel(cursor)?;
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_rel(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_additive(cursor)?;
    loop {
        let op = if cursor.eat_keyword(KW_GE) {
            BinOp::Ge
        } else if cursor.eat_keyword(KW_LE) {
            BinOp::Le
        } else if cursor.eat_keyword(KW_GT) {
            BinOp::Gt
        } else if cursor.eat_keyword(KW_LT) {
            BinOp::Lt
        } else {
            break;
        };
        let rhs = parse_additive(cursor)?;
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_additive(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    let mut lhs = parse_primary(cursor)?;
    loop {
        let op = if cursor.eat_keyword(KW_PLUS) {
            BinOp::Add
        } else if cursor.eat_keyword(KW_MINUS) {
            BinOp::Sub
        } else {
            break;
        };
        let rhs = parse_primary(cursor)?;
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

fn parse_primary(cursor: &mut Cursor) -> Result<Expr, ParseError> {
    match cursor.next() {
        Some(Token::IntLit(v)) => Ok(Expr::IntLit(v)),
        Some(Token::StringRef(idx)) => Ok(Expr::StringRef(idx)),
        Some(Token::Var(slot)) => Ok(Expr::Var(cursor.resolve_var(slot))),
        Some(Token::Keyword(id)) if id == KW_TRUE => Ok(Expr::BoolLit(true)),
        Some(Token::Keyword(id)) if id == KW_FALSE => Ok(Expr::BoolLit(false)),
        Some(Token::Ascii(b'(')) => {
            let inner = parse_expr(cursor)?;
            cursor.expect_ascii(b')', ")")?;
            Ok(inner)
        }
        Some(Token::Func(id)) => {
            cursor.pos -= 1;
            let _ = id;
            Ok(Expr::Call(parse_call(cursor)?))
        }
        Some(tok) => Err(ParseError::Unexpected {
            expected: "expression",
            found: tok,
        }),
        None => Err(ParseError::UnexpectedEof("expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VarKind;

    fn kw(id: u16) -> Token {
        Token::Keyword(id)
    }

    #[test]
    fn parses_single_empty_block() {
        let tokens = vec![
            kw(KW_IF),
            Token::Ascii(b'('),
            Token::IntLit(1),
            Token::Ascii(b')'),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(program.blocks.len(), 1);
        assert_eq!(program.blocks[0].condition, Expr::IntLit(1));
        assert!(program.blocks[0].body.is_empty());
        assert!(program.blocks[0].else_body.is_empty());
    }

    #[test]
    fn condition_without_parens_is_accepted() {
        let tokens = vec![kw(KW_IF), Token::IntLit(1), kw(KW_ENDIF)];
        let program = parse(&tokens).unwrap();
        assert_eq!(program.blocks[0].condition, Expr::IntLit(1));
    }

    #[test]
    fn slot_declarations_set_var_kind_for_later_references() {
        let tokens = vec![
            kw(KW_INT),
            Token::Ascii(b'('),
            Token::Var(2),
            Token::Ascii(b')'),
            kw(KW_IF),
            Token::Var(2),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(
            program.blocks[0].condition,
            Expr::Var(VarRef {
                kind: VarKind::Int,
                index: 2
            })
        );
    }

    #[test]
    fn parses_assignment_statement() {
        let tokens = vec![
            kw(KW_IF),
            Token::IntLit(1),
            Token::Var(0),
            kw(KW_ASSIGN),
            Token::IntLit(7),
            Token::Ascii(b';'),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(
            program.blocks[0].body[0],
            Stmt::Assign {
                slot: VarRef {
                    kind: VarKind::Int,
                    index: 0
                },
                value: Expr::IntLit(7)
            }
        );
    }

    #[test]
    fn parses_call_statement_with_args() {
        let tokens = vec![
            kw(KW_IF),
            Token::IntLit(1),
            Token::Func(30),
            Token::Ascii(b'('),
            Token::IntLit(1),
            Token::Ascii(b','),
            Token::IntLit(2),
            Token::Ascii(b')'),
            Token::Ascii(b';'),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(
            program.blocks[0].body[0],
            Stmt::Call(Call {
                func_id: 30,
                args: vec![Expr::IntLit(1), Expr::IntLit(2)],
            })
        );
    }

    #[test]
    fn parses_nested_if_else_and_binary_ops() {
        let tokens = vec![
            kw(KW_IF),
            Token::IntLit(1),
            kw(KW_AND),
            Token::IntLit(0),
            kw(KW_IF),
            Token::IntLit(1),
            kw(KW_EQ),
            Token::IntLit(1),
            kw(KW_ENDIF),
            kw(KW_ELSE),
            kw(KW_ENDIF),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(
            program.blocks[0].condition,
            Expr::Binary(
                BinOp::And,
                Box::new(Expr::IntLit(1)),
                Box::new(Expr::IntLit(0))
            )
        );
        assert!(matches!(program.blocks[0].body[0], Stmt::Block(_)));
    }

    #[test]
    fn top_level_else_body_is_captured() {
        let tokens = vec![
            kw(KW_IF),
            Token::IntLit(0),
            Token::Func(1),
            Token::Ascii(b'('),
            Token::Ascii(b')'),
            Token::Ascii(b';'),
            kw(KW_ELSE),
            Token::Func(2),
            Token::Ascii(b'('),
            Token::Ascii(b')'),
            Token::Ascii(b';'),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(program.blocks[0].body.len(), 1);
        assert_eq!(program.blocks[0].else_body.len(), 1);
    }

    #[test]
    fn arithmetic_operators_parse_left_folded() {
        let tokens = vec![
            kw(KW_IF),
            Token::IntLit(1),
            kw(KW_PLUS),
            Token::IntLit(2),
            kw(KW_MINUS),
            Token::IntLit(3),
            kw(KW_ENDIF),
        ];
        let program = parse(&tokens).unwrap();
        assert_eq!(
            program.blocks[0].condition,
            Expr::Binary(
                BinOp::Sub,
                Box::new(Expr::Binary(
                    BinOp::Add,
                    Box::new(Expr::IntLit(1)),
                    Box::new(Expr::IntLit(2))
                )),
                Box::new(Expr::IntLit(3))
            )
        );
    }

    #[test]
    fn missing_endif_is_an_error() {
        let tokens = vec![kw(KW_IF), Token::IntLit(1)];
        assert!(parse(&tokens).is_err());
    }
}
