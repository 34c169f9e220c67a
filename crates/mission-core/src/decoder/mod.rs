pub mod container;
pub mod parser;
pub mod tables;
pub mod tokens;

use std::collections::HashMap;

use crate::ast::{Program, VarKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Container(#[from] container::ContainerError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
}

/// A decoded `.tok` file: the parsed program, the slot-kind declarations
/// the script's header registered, and the slot count the compiler
/// declared (used only to pre-size the slot arrays; §3.2 arrays still
/// grow lazily past it).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedScript {
    pub program: Program,
    pub declared_slot_count: usize,
}

/// Decodes a `.tok` file per §4.B/§6.1/§7.1: this function never panics
/// and never returns `Err` for malformed *content* — only a truncated
/// container header/payload, which indicates the bytes aren't a `.tok`
/// file at all, is rejected. Any token or syntax the recursive-descent
/// parser can't make sense of degrades to an empty program rather than
/// propagating a parse error, matching "decode returns a value (never
/// throws)" (§8 invariant).
pub fn decode(bytes: &[u8]) -> Result<DecodedScript, container::ContainerError> {
    let container = container::parse(bytes)?;
    let tokens = tokens::tokenize(&container.segments);
    let program = parser::parse(&tokens).unwrap_or_default();
    Ok(DecodedScript {
        program,
        declared_slot_count: container.declared_slot_count,
    })
}

/// Collects every slot declaration in a decoded program's source order is
/// not preserved by `DecodedScript` (the parser only needs the kind map
/// transiently); exposed for callers that want to pre-size `Slots` using
/// the same `int(n)`/`obj(n)`/`pos(n)` declarations the parser consumed.
/// Most hosts only need `declared_slot_count` for this; this is a finer
/// per-kind breakdown used by `mission-test` fixtures and the CLI.
pub fn slot_kinds(bytes: &[u8]) -> HashMap<u32, VarKind> {
    let Ok(container) = container::parse(bytes) else {
        return HashMap::new();
    };
    let tokens = tokens::tokenize(&container.segments);
    // Re-run just the declaration-scanning prefix of the parser by
    // decoding the full program and reading back the kinds of every
    // `Var` the program actually references; cheap and avoids exposing
    // the parser's private `Cursor`.
    let program = parser::parse(&tokens).unwrap_or_default();
    let mut kinds = HashMap::new();
    fn walk_expr(expr: &crate::ast::Expr, kinds: &mut HashMap<u32, VarKind>) {
        use crate::ast::Expr;
        match expr {
            Expr::Var(v) => {
                kinds.insert(v.index, v.kind);
            }
            Expr::Call(c) => {
                for a in &c.args {
                    walk_expr(a, kinds);
                }
            }
            Expr::Binary(_, l, r) => {
                walk_expr(l, kinds);
                walk_expr(r, kinds);
            }
            _ => {}
        }
    }
    fn walk_stmts(stmts: &[crate::ast::Stmt], kinds: &mut HashMap<u32, VarKind>) {
        use crate::ast::Stmt;
        for stmt in stmts {
            match stmt {
                Stmt::Block(b) => {
                    walk_expr(&b.condition, kinds);
                    walk_stmts(&b.body, kinds);
                    walk_stmts(&b.else_body, kinds);
                }
                Stmt::Assign { slot, value } => {
                    kinds.insert(slot.index, slot.kind);
                    walk_expr(value, kinds);
                }
                Stmt::Call(c) => {
                    for a in &c.args {
                        walk_expr(a, kinds);
                    }
                }
            }
        }
    }
    for block in &program.blocks {
        walk_expr(&block.condition, &mut kinds);
        walk_stmts(&block.body, &mut kinds);
        walk_stmts(&block.else_body, &mut kinds);
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_container(leading_empty: usize, segments: &[&[u8]]) -> Vec<u8> {
        let mut payload = Vec::new();
        for _ in 0..leading_empty {
            payload.push(0);
        }
        for (i, seg) in segments.iter().enumerate() {
            if i > 0 || leading_empty > 0 {
                payload.push(0);
            }
            payload.extend_from_slice(seg);
        }
        let null_count = payload.iter().filter(|&&b| b == 0).count() as u32;
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&null_count.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn decodes_minimal_script_end_to_end() {
        use tables::{KW_ENDIF, KW_IF};

        let token_stream = [0x80, KW_IF as u8, b'1', 0x80, KW_ENDIF as u8];
        let bytes = build_container(2, &[&token_stream]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.declared_slot_count, 2);
        assert_eq!(decoded.program.blocks.len(), 1);
    }

    #[test]
    fn malformed_bytes_never_panic_and_never_error_past_the_container() {
        // Too short for a header: this is the one case decode() rejects.
        assert!(decode(&[1, 2, 3]).is_err());
        // A well-formed container with garbage payload degrades to an
        // empty program rather than propagating a parse error.
        let garbage = build_container(0, &[&[0xFF, 0xFE, 0xFD]]);
        let decoded = decode(&garbage).unwrap();
        assert!(decoded.program.blocks.is_empty());
    }
}
