//! # Segment Assembler
//!
//! Buffers ordered segments per transaction and rebuilds the payload once
//! every index has arrived.
//!
//! - Buffers untouched for `segment_ttl` are purged by [`SegmentAssembler::gc_expired`]
//! - At most `max_pending_buffers` transactions are buffered; the least
//!   recently touched are purged first

use crate::algorithms::reassemble;
use crate::domain::{
    invariant_segments_contiguous, LedgerError, PipelineConfig, Segment, SegmentOutcome, ShardId,
    TxId,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Partial payload for one transaction.
#[derive(Clone, Debug)]
struct SegmentBuffer {
    total: u32,
    shard_id: ShardId,
    segments: BTreeMap<u32, Segment>,
    started_at: u64,
    touched_at: u64,
}

impl SegmentBuffer {
    fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.touched_at) >= ttl_ms
    }
}

/// Reassembly buffers keyed by transaction id.
#[derive(Debug)]
pub struct SegmentAssembler {
    buffers: Mutex<HashMap<TxId, SegmentBuffer>>,
    ttl_ms: u64,
    max_pending: usize,
}

impl SegmentAssembler {
    /// Create an assembler from pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            ttl_ms: config.segment_ttl_secs.saturating_mul(1000),
            max_pending: config.max_pending_buffers,
        }
    }

    /// Add one segment at time `now` (milliseconds).
    pub fn submit(&self, segment: Segment, now: u64) -> Result<SegmentOutcome, LedgerError> {
        segment.validate()?;

        let mut buffers = self.buffers.lock();
        let buffer = buffers
            .entry(segment.transaction_id.clone())
            .or_insert_with(|| SegmentBuffer {
                total: segment.total_segments,
                shard_id: segment.shard_id,
                segments: BTreeMap::new(),
                started_at: now,
                touched_at: now,
            });

        if buffer.total != segment.total_segments {
            return Err(LedgerError::InvalidInput(format!(
                "total_segments {} disagrees with buffered {} for {}",
                segment.total_segments, buffer.total, segment.transaction_id
            )));
        }
        if buffer.segments.contains_key(&segment.segment_index) {
            return Err(LedgerError::InvalidInput(format!(
                "duplicate segment {} for {}",
                segment.segment_index, segment.transaction_id
            )));
        }
        if buffer.shard_id != segment.shard_id {
            warn!(
                "[ledger] segment {} of {} arrived from shard {} (buffer opened on {})",
                segment.segment_index, segment.transaction_id, segment.shard_id, buffer.shard_id
            );
        }

        let tx_id = segment.transaction_id.clone();
        buffer.segments.insert(segment.segment_index, segment);
        buffer.touched_at = now;

        let received = buffer.segments.len() as u32;
        if received < buffer.total {
            return Ok(SegmentOutcome::Awaiting {
                received,
                total: buffer.total,
            });
        }

        let buffer = buffers
            .remove(&tx_id)
            .ok_or_else(|| LedgerError::tx_not_found(&tx_id))?;
        let indices: Vec<u32> = buffer.segments.keys().copied().collect();
        if !invariant_segments_contiguous(&indices, buffer.total) {
            return Err(LedgerError::InvalidInput(format!(
                "segments for {} are not contiguous",
                tx_id
            )));
        }
        let segments: Vec<Segment> = buffer.segments.into_values().collect();
        Ok(SegmentOutcome::Complete(reassemble(&segments)?))
    }

    /// Purge buffers untouched for the TTL. Returns the purged ids.
    pub fn gc_expired(&self, now: u64) -> Vec<TxId> {
        let mut buffers = self.buffers.lock();
        let expired: Vec<TxId> = buffers
            .iter()
            .filter(|(_, b)| b.is_expired(now, self.ttl_ms))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            buffers.remove(id);
        }
        expired
    }

    /// Purge the least recently touched buffers above the limit.
    pub fn enforce_max_pending(&self) -> Vec<TxId> {
        let mut buffers = self.buffers.lock();
        if buffers.len() <= self.max_pending {
            return Vec::new();
        }

        let mut entries: Vec<(TxId, u64, u64)> = buffers
            .iter()
            .map(|(id, b)| (id.clone(), b.touched_at, b.started_at))
            .collect();
        entries.sort_by_key(|(_, touched, started)| (*touched, *started));

        let to_remove = buffers.len() - self.max_pending;
        let purged: Vec<TxId> = entries
            .into_iter()
            .take(to_remove)
            .map(|(id, _, _)| id)
            .collect();
        for id in &purged {
            buffers.remove(id);
        }
        purged
    }

    /// Drop the buffer of a transaction that reached a terminal state.
    pub fn discard(&self, tx_id: &str) -> bool {
        self.buffers.lock().remove(tx_id).is_some()
    }

    /// Segments buffered for `tx_id`.
    pub fn received(&self, tx_id: &str) -> Option<u32> {
        self.buffers
            .lock()
            .get(tx_id)
            .map(|b| b.segments.len() as u32)
    }

    /// Number of transactions with buffered segments.
    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::segment_payload;

    fn assembler() -> SegmentAssembler {
        SegmentAssembler::new(&PipelineConfig::for_testing())
    }

    fn seg(tx: &str, index: u32, total: u32, chunk: &str) -> Segment {
        Segment {
            transaction_id: tx.into(),
            shard_id: 0,
            segment_index: index,
            total_segments: total,
            chunk: chunk.into(),
        }
    }

    #[test]
    fn test_reverse_order_reconstructs() {
        let asm = assembler();
        let mut segments = segment_payload("tx-1", 0, "abcdefghijkl", 5);
        segments.reverse();

        let mut outcomes = Vec::new();
        for s in segments {
            outcomes.push(asm.submit(s, 0).unwrap());
        }
        assert_eq!(
            outcomes[0],
            SegmentOutcome::Awaiting {
                received: 1,
                total: 3
            }
        );
        assert_eq!(
            outcomes[2],
            SegmentOutcome::Complete("abcdefghijkl".into())
        );
        assert!(asm.is_empty());
    }

    #[test]
    fn test_shuffled_order_reassembles_by_index() {
        let asm = assembler();
        assert!(matches!(
            asm.submit(seg("tx-1", 2, 4, "ee"), 0).unwrap(),
            SegmentOutcome::Awaiting { received: 1, .. }
        ));
        asm.submit(seg("tx-1", 0, 4, "ab"), 1).unwrap();
        asm.submit(seg("tx-1", 3, 4, "f"), 2).unwrap();
        assert_eq!(
            asm.submit(seg("tx-1", 1, 4, "cd"), 3).unwrap(),
            SegmentOutcome::Complete("abcdeef".into())
        );
        assert!(asm.is_empty());
    }

    #[test]
    fn test_single_segment_completes() {
        let asm = assembler();
        assert_eq!(
            asm.submit(seg("tx-1", 0, 1, "x"), 0).unwrap(),
            SegmentOutcome::Complete("x".into())
        );
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let asm = assembler();
        asm.submit(seg("tx-1", 0, 2, "a"), 0).unwrap();
        assert!(matches!(
            asm.submit(seg("tx-1", 0, 2, "a"), 0),
            Err(LedgerError::InvalidInput(_))
        ));
        assert_eq!(asm.received("tx-1"), Some(1));
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let asm = assembler();
        asm.submit(seg("tx-1", 0, 2, "a"), 0).unwrap();
        assert!(asm.submit(seg("tx-1", 1, 3, "b"), 0).is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let asm = assembler();
        assert!(asm.submit(seg("tx-1", 3, 3, "a"), 0).is_err());
        assert!(asm.submit(seg("", 0, 1, "a"), 0).is_err());
        assert!(asm.is_empty());
    }

    #[test]
    fn test_gc_expired() {
        let asm = assembler();
        asm.submit(seg("tx-old", 0, 2, "a"), 0).unwrap();
        asm.submit(seg("tx-new", 0, 2, "a"), 4_000).unwrap();

        let purged = asm.gc_expired(5_000);
        assert_eq!(purged, vec!["tx-old".to_string()]);
        assert_eq!(asm.len(), 1);
        assert!(asm.received("tx-new").is_some());
    }

    #[test]
    fn test_touch_extends_ttl() {
        let asm = assembler();
        asm.submit(seg("tx-1", 0, 3, "a"), 0).unwrap();
        asm.submit(seg("tx-1", 1, 3, "b"), 4_000).unwrap();
        assert!(asm.gc_expired(5_000).is_empty());
    }

    #[test]
    fn test_enforce_max_pending_purges_oldest() {
        let asm = assembler();
        for i in 0..20u64 {
            asm.submit(seg(&format!("tx-{}", i), 0, 2, "a"), i).unwrap();
        }
        let purged = asm.enforce_max_pending();
        assert_eq!(purged.len(), 4);
        assert!(purged.contains(&"tx-0".to_string()));
        assert!(purged.contains(&"tx-3".to_string()));
        assert_eq!(asm.len(), 16);
    }

    #[test]
    fn test_discard() {
        let asm = assembler();
        asm.submit(seg("tx-1", 0, 2, "a"), 0).unwrap();
        assert!(asm.discard("tx-1"));
        assert!(!asm.discard("tx-1"));
    }
}
