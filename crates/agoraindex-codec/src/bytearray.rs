//! Chunked byte-array strings.
//!
//! Long strings arrive as a length-prefixed sequence of words:
//!
//! ```text
//! [ full_chunk_count, chunk_0 .. chunk_n-1, pending_word, pending_len ]
//! ```
//!
//! Each full chunk packs exactly 31 bytes; the pending word carries the
//! final `pending_len` (< 31) bytes. Decoding is strict: a chunk wider than
//! 31 bytes, a pending length ≥ 31, or a pending word wider than its
//! declared length all reject the payload rather than misreading it.

use crate::error::DecodeError;
use crate::felt::Felt;

/// Bytes packed into one full chunk word.
pub const CHUNK_BYTES: usize = 31;

/// Upper bound on the declared chunk count; anything above this is treated
/// as corrupt rather than allocated.
const MAX_CHUNKS: u64 = 4_096;

/// Decode a chunked string starting at `words[0]`.
///
/// Returns the decoded string and the number of words consumed
/// (`full_chunk_count + 3`).
pub fn decode(words: &[Felt], event: &str) -> Result<(String, usize), DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidByteArray {
        event: event.to_string(),
        reason,
    };

    let count_word = words.first().ok_or_else(|| DecodeError::TruncatedEvent {
        event: event.to_string(),
        field: "byte array header".to_string(),
        needed: 1,
        available: 0,
    })?;
    let full_chunks = count_word
        .to_u64()
        .map_err(|_| invalid("chunk count does not fit u64".into()))?;
    if full_chunks > MAX_CHUNKS {
        return Err(invalid(format!("chunk count {full_chunks} exceeds limit")));
    }

    let needed = full_chunks as usize + 3;
    if words.len() < needed {
        return Err(DecodeError::TruncatedEvent {
            event: event.to_string(),
            field: "byte array body".to_string(),
            needed: needed - words.len(),
            available: words.len().saturating_sub(1),
        });
    }

    let mut bytes = Vec::with_capacity(full_chunks as usize * CHUNK_BYTES);
    for chunk in &words[1..=full_chunks as usize] {
        let raw = chunk.as_bytes();
        if raw[0] != 0 {
            return Err(invalid("full chunk wider than 31 bytes".into()));
        }
        bytes.extend_from_slice(&raw[1..]);
    }

    let pending_word = &words[full_chunks as usize + 1];
    let pending_len = words[full_chunks as usize + 2]
        .to_u64()
        .map_err(|_| invalid("pending length does not fit u64".into()))?
        as usize;
    if pending_len >= CHUNK_BYTES {
        return Err(invalid(format!(
            "pending length {pending_len} inconsistent with chunked layout"
        )));
    }
    let raw = pending_word.as_bytes();
    let cut = 32 - pending_len;
    if raw[..cut].iter().any(|&b| b != 0) {
        return Err(invalid("pending word wider than its declared length".into()));
    }
    bytes.extend_from_slice(&raw[cut..]);

    let text = String::from_utf8(bytes).map_err(|e| invalid(e.to_string()))?;
    Ok((text, needed))
}

/// Encode a string into the chunked wire layout. Used by tests and by
/// fixtures that synthesize events.
pub fn encode(s: &str) -> Vec<Felt> {
    let bytes = s.as_bytes();
    let full_chunks = bytes.len() / CHUNK_BYTES;
    let pending = &bytes[full_chunks * CHUNK_BYTES..];

    let mut words = Vec::with_capacity(full_chunks + 3);
    words.push(Felt::from_u64(full_chunks as u64));
    for chunk in bytes.chunks_exact(CHUNK_BYTES) {
        let mut b = [0u8; 32];
        b[1..].copy_from_slice(chunk);
        // 31-byte chunks always fit the field
        words.push(Felt::from_bytes(b).unwrap_or(Felt::ZERO));
    }
    let mut b = [0u8; 32];
    b[32 - pending.len()..].copy_from_slice(pending);
    words.push(Felt::from_bytes(b).unwrap_or(Felt::ZERO));
    words.push(Felt::from_u64(pending.len() as u64));
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(s: &str) {
        let words = encode(s);
        let (decoded, consumed) = decode(&words, "Test").unwrap();
        assert_eq!(decoded, s);
        assert_eq!(consumed, words.len());
    }

    #[test]
    fn roundtrip_empty() {
        roundtrip("");
    }

    #[test]
    fn roundtrip_short() {
        roundtrip("agora");
    }

    #[test]
    fn roundtrip_exact_chunk() {
        roundtrip(&"a".repeat(31));
    }

    #[test]
    fn roundtrip_multi_chunk_with_partial() {
        roundtrip(&"word".repeat(20)); // 80 bytes: 2 full chunks + 18 pending
    }

    #[test]
    fn trailing_words_are_not_consumed() {
        let mut words = encode("hello");
        words.push(Felt::from_u64(99));
        let (decoded, consumed) = decode(&words, "Test").unwrap();
        assert_eq!(decoded, "hello");
        assert_eq!(consumed, words.len() - 1);
    }

    #[test]
    fn rejects_truncated_body() {
        let mut words = encode(&"x".repeat(40));
        words.pop();
        words.pop();
        assert!(matches!(
            decode(&words, "Test"),
            Err(DecodeError::TruncatedEvent { .. })
        ));
    }

    #[test]
    fn rejects_inconsistent_pending_len() {
        let mut words = encode("hi");
        let last = words.len() - 1;
        words[last] = Felt::from_u64(31); // pending_len must be < 31
        assert!(matches!(
            decode(&words, "Test"),
            Err(DecodeError::InvalidByteArray { .. })
        ));
    }

    #[test]
    fn rejects_overwide_pending_word() {
        let mut words = encode("hi");
        let pending = words.len() - 2;
        // claims 2 pending bytes but carries 3
        words[pending] = Felt::from_u64(0x61_61_61);
        assert!(matches!(
            decode(&words, "Test"),
            Err(DecodeError::InvalidByteArray { .. })
        ));
    }

    #[test]
    fn rejects_overwide_full_chunk() {
        let mut words = encode(&"y".repeat(35));
        // corrupt the full chunk so its top byte is set
        let mut raw = *words[1].as_bytes();
        raw[0] = 0x01;
        words[1] = Felt::from_bytes(raw).unwrap();
        assert!(matches!(
            decode(&words, "Test"),
            Err(DecodeError::InvalidByteArray { .. })
        ));
    }

    #[test]
    fn rejects_absurd_chunk_count() {
        let words = vec![Felt::from_u64(1_000_000), Felt::ZERO, Felt::ZERO];
        assert!(matches!(
            decode(&words, "Test"),
            Err(DecodeError::InvalidByteArray { .. })
        ));
    }
}
