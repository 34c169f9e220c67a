//! Byte-to-token lowering (§4.B "Byte-to-token lowering", "Digit
//! coalescing"). Each non-empty `.tok` segment is scanned pairwise, low
//! byte first, per the prefix table in the spec; segments are then
//! concatenated (an `Ascii(';')` token inserted between them) and runs of
//! ASCII digits are coalesced into single `Int` literals before the
//! recursive-descent parser sees the stream.
//!
//! The decoder never throws on unrecognised input (§7.1): there is no
//! error type here. Bytes this module can't make sense of fall back to
//! the orphan-high-byte rule (a statement terminator) rather than
//! aborting.

use crate::decoder::tables::KEYWORD_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A host function id, `0..KEYWORD_THRESHOLD`.
    Func(u16),
    /// A syntax keyword id, `KEYWORD_THRESHOLD..`.
    Keyword(u16),
    /// A raw variable slot number; not yet resolved to a `VarKind` (that
    /// happens once the parser has seen the slot's declaration).
    Var(u32),
    StringRef(u32),
    IntLit(i32),
    /// A standalone printable byte that didn't fit any prefix form:
    /// punctuation, digits (pre-coalescing), or a synthesized `;`.
    Ascii(u8),
}

const SEMICOLON: u8 = b';';
const OPEN_PAREN: u8 = b'(';

fn is_known_keyword_id(id: u16) -> bool {
    crate::decoder::tables::keyword_name(id).is_some()
}

/// Lowers one non-empty segment's raw bytes into a flat token run. Never
/// fails: any byte pattern this function doesn't recognise degrades to an
/// `Ascii` token or, at the tail of a segment, the orphan-high-byte
/// statement terminator.
fn lower_segment(seg: &[u8]) -> Vec<Token> {
    let mut out = Vec::new();
    let mut i = 0usize;
    let len = seg.len();

    while i < len {
        let b = seg[i];
        if b < 0x80 {
            out.push(Token::Ascii(b));
            i += 1;
            continue;
        }

        let Some(&s) = seg.get(i + 1) else {
            // Orphan high-byte at end of segment: terminate the statement.
            out.push(Token::Ascii(SEMICOLON));
            i += 1;
            continue;
        };

        match b {
            0x80 => {
                if s < 0x80 {
                    out.push(Token::Ascii(s));
                    i += 2;
                } else {
                    let is_call = seg.get(i + 2) == Some(&0x80) && seg.get(i + 3) == Some(&OPEN_PAREN);
                    if is_call {
                        out.push(Token::Func(s as u16 - 0x80));
                    } else if s as u16 >= KEYWORD_THRESHOLD {
                        out.push(Token::Keyword(s as u16));
                    } else {
                        out.push(Token::Func(s as u16));
                    }
                    i += 2;
                }
            }
            0x81 => {
                if s < 0x80 {
                    out.push(Token::Ascii(s));
                    i += 2;
                } else if s == 0x81 && seg.get(i + 2).is_some_and(|&t| t >= 0x81) {
                    // `0x81 0x81 [>=0x81]`: a stand-alone-accumulator
                    // compiler artifact. Skip the pair, emit nothing, and
                    // let the third byte be scanned fresh.
                    i += 2;
                } else {
                    out.push(Token::Var(s as u32 - 0x80));
                    i += 2;
                }
            }
            0x82 => {
                if s < 0x80 {
                    out.push(Token::Ascii(s));
                } else {
                    out.push(Token::StringRef(s as u32 - 0x80));
                }
                i += 2;
            }
            _ => {
                // b >= 0x83: extended token.
                if s == 0x80 && seg.get(i + 2) == Some(&OPEN_PAREN) {
                    out.push(Token::Func(b as u16 - 0x80));
                    i += 2;
                } else if s == 0x81 && seg.get(i + 2) == Some(&OPEN_PAREN) {
                    out.push(Token::Func(b as u16));
                    i += 2;
                } else if b as u16 >= KEYWORD_THRESHOLD && is_known_keyword_id(b as u16) {
                    out.push(Token::Keyword(b as u16));
                    i += 1;
                } else {
                    out.push(Token::IntLit(s as i32 - 0x80));
                    i += 2;
                }
            }
        }
    }

    out
}

/// Concatenates every non-empty segment's lowered token run, inserting an
/// `Ascii(';')` separator between segments (§4.B "Segments are
/// concatenated, with `Ascii(';')` inserted between them").
fn concat_segments(segments: &[Vec<u8>]) -> Vec<Token> {
    let mut out = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            out.push(Token::Ascii(SEMICOLON));
        }
        out.extend(lower_segment(seg));
    }
    out
}

/// Scans a lowered token stream combining runs of `Ascii` digits (and an
/// optional leading `Ascii('-')` immediately followed by a digit) into a
/// single `IntLit` token.
fn coalesce_digits(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0usize;
    while i < tokens.len() {
        let is_digit = |t: &Token| matches!(t, Token::Ascii(b) if b.is_ascii_digit());
        let is_minus = matches!(tokens[i], Token::Ascii(b'-'));
        let starts_number = is_digit(&tokens[i])
            || (is_minus && tokens.get(i + 1).is_some_and(is_digit));

        if !starts_number {
            out.push(tokens[i]);
            i += 1;
            continue;
        }

        let mut text = String::new();
        if is_minus {
            text.push('-');
            i += 1;
        }
        while let Some(Token::Ascii(b)) = tokens.get(i) {
            if b.is_ascii_digit() {
                text.push(*b as char);
                i += 1;
            } else {
                break;
            }
        }
        let value: i32 = text.parse().unwrap_or(0);
        out.push(Token::IntLit(value));
    }
    out
}

/// Lowers every segment and coalesces digit runs, producing the flat
/// token stream the recursive-descent parser consumes.
pub fn tokenize(segments: &[Vec<u8>]) -> Vec<Token> {
    coalesce_digits(concat_segments(segments))
}
