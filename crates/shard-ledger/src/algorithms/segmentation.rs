//! # Payload Segmentation
//!
//! Splits payloads into bounded chunks and rebuilds them.

use crate::domain::{LedgerError, Segment, ShardId};

/// Split `payload` into chunks of at most `segment_size` bytes.
///
/// Chunks end on char boundaries; a single char wider than `segment_size`
/// forms its own chunk. Empty payloads yield no chunks.
pub fn split_payload(payload: &str, segment_size: usize) -> Vec<String> {
    let size = segment_size.max(1);
    let mut chunks = Vec::with_capacity(payload.len().div_ceil(size));
    let mut current = String::with_capacity(size);

    for ch in payload.chars() {
        if !current.is_empty() && current.len() + ch.len_utf8() > size {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Build the segments for one transaction.
pub fn segment_payload(
    transaction_id: &str,
    shard_id: ShardId,
    payload: &str,
    segment_size: usize,
) -> Vec<Segment> {
    let chunks = split_payload(payload, segment_size);
    let total = chunks.len() as u32;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Segment {
            transaction_id: transaction_id.to_string(),
            shard_id,
            segment_index: i as u32,
            total_segments: total,
            chunk,
        })
        .collect()
}

/// Concatenate chunks in ascending segment index, regardless of input order.
pub fn reassemble(segments: &[Segment]) -> Result<String, LedgerError> {
    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.segment_index);

    for (pos, seg) in ordered.iter().enumerate() {
        if seg.segment_index != pos as u32 {
            return Err(LedgerError::InvalidInput(format!(
                "segment {} missing or duplicated",
                pos
            )));
        }
    }
    Ok(ordered.iter().map(|s| s.chunk.as_str()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_twelve_by_five() {
        let chunks = split_payload("abcdefghijkl", 5);
        let lens: Vec<usize> = chunks.iter().map(String::len).collect();
        assert_eq!(lens, vec![5, 5, 2]);
    }

    #[test]
    fn test_split_exact_multiple() {
        assert_eq!(split_payload("abcdef", 3).len(), 2);
        assert!(split_payload("", 3).is_empty());
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let payload = "héllo wörld";
        let chunks = split_payload(payload, 4);
        assert!(chunks.iter().all(|c| c.len() <= 4));
        assert_eq!(chunks.concat(), payload);
    }

    #[test]
    fn test_split_wide_char_alone() {
        let chunks = split_payload("a😀b", 2);
        assert_eq!(chunks, vec!["a", "😀", "b"]);
    }

    #[test]
    fn test_reassemble_any_order() {
        let mut segments = segment_payload("tx-1", 0, "abcdefghijkl", 5);
        assert_eq!(segments.len(), 3);
        segments.reverse();
        assert_eq!(reassemble(&segments).unwrap(), "abcdefghijkl");
    }

    #[test]
    fn test_reassemble_gap_rejected() {
        let mut segments = segment_payload("tx-1", 0, "abcdefghijkl", 5);
        segments.remove(1);
        assert!(reassemble(&segments).is_err());
    }
}
