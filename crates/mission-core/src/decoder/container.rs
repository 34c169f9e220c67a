//! `.tok` binary container parsing (§4.B, §6.1).
//!
//! Layout: an 8-byte little-endian header (`dataSize: u32`, `nullCount:
//! u32`) followed by `dataSize` bytes of payload. The payload splits on
//! `0x00` bytes into segments. The count of *leading empty* segments
//! declares the number of variable slots the compiler reserved (one null
//! per slot); everything after that is a non-empty segment to be lowered
//! by `decoder::tokens` and concatenated, with an `Ascii(';')` inserted
//! between segments, into one token stream (§4.B "Byte-to-token
//! lowering"). There is no string table inside the container itself —
//! `StringRef` indices resolve through the *host's* string table (§4.H),
//! not anything carried in the `.tok` bytes.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContainerError {
    #[error("container is shorter than the 8-byte header")]
    TruncatedHeader,
    #[error("declared dataSize {declared} exceeds remaining bytes {available}")]
    TruncatedPayload { declared: u32, available: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokContainer {
    /// Number of leading empty segments; the variable-slot count the
    /// compiler reserved (§3.2: arrays also grow lazily past this).
    pub declared_slot_count: usize,
    /// Every non-empty segment, in order, not yet lowered to tokens.
    pub segments: Vec<Vec<u8>>,
}

/// §8 boundary behavior: a payload with no `0x00` byte at all is a single
/// segment; if it's empty the program is empty and the slot count is 1
/// (the one empty "segment" is both the leading-slot marker and the only
/// segment present — there is no token stream). `parse` never errors on
/// the payload's *contents*, only on a truncated header/declared length
/// (§7.1: malformed binary never throws past the container boundary).
pub fn parse(bytes: &[u8]) -> Result<TokContainer, ContainerError> {
    if bytes.len() < 8 {
        return Err(ContainerError::TruncatedHeader);
    }
    let data_size = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let _null_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    let payload = &bytes[8..];
    if (data_size as usize) > payload.len() {
        return Err(ContainerError::TruncatedPayload {
            declared: data_size,
            available: payload.len(),
        });
    }
    let payload = &payload[..data_size as usize];

    let mut declared_slot_count = 0usize;
    let mut segments = Vec::new();
    let mut saw_any_segment = false;
    for seg in payload.split(|&b| b == 0) {
        saw_any_segment = true;
        if seg.is_empty() {
            declared_slot_count += 1;
        } else {
            segments.push(seg.to_vec());
        }
    }
    // A wholly empty payload (`dataSize == 0`) still yields one empty
    // segment from `split`, which the loop above already counted; an
    // explicitly empty container with no bytes at all still counts as one
    // slot per §8's boundary behavior.
    if !saw_any_segment {
        declared_slot_count = 1;
    }

    Ok(TokContainer {
        declared_slot_count,
        segments,
    })
}
