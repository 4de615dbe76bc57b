//! # Conflict Tracker
//!
//! Duplicate identifier detection with a bounded log.
//!
//! Lock order: the caller holds the ledger lock and passes the chain in;
//! the conflict log lock is taken second.

use crate::domain::{BlockIndex, ConflictLog, ConflictRecord, LedgerError, Transaction, TxId};
use crate::service::ledger::Chain;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Default)]
struct ConflictRing {
    total: u64,
    entries: VecDeque<ConflictRecord>,
}

/// Records rejected duplicates in a ring buffer.
#[derive(Debug)]
pub struct ConflictTracker {
    ring: Mutex<ConflictRing>,
    capacity: usize,
}

impl ConflictTracker {
    /// Create a tracker retaining at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(ConflictRing {
                total: 0,
                entries: VecDeque::with_capacity(capacity.min(1024)),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Check `identifier` against the chain; log and return true on a hit.
    pub fn check_and_log(&self, chain: &Chain, identifier: &str) -> bool {
        if !chain.find_identifier(identifier) {
            return false;
        }
        self.record(identifier);
        true
    }

    /// Append a conflict record, evicting the oldest when full.
    pub fn record(&self, identifier: &str) {
        let record = ConflictRecord::new(identifier);
        warn!("[ledger] {}", record.message);

        let mut ring = self.ring.lock();
        ring.total += 1;
        if ring.entries.len() == self.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(record);
    }

    /// Snapshot of the log.
    pub fn log(&self) -> ConflictLog {
        let ring = self.ring.lock();
        ConflictLog {
            total: ring.total,
            entries: ring.entries.iter().cloned().collect(),
        }
    }

    /// Insert two never-finalized transactions A→B and B→A.
    ///
    /// Runs under the ledger lock held by the caller.
    pub fn stage_deadlock(
        &self,
        chain: &mut Chain,
        block_a: BlockIndex,
        block_b: BlockIndex,
        ids: (TxId, TxId),
    ) -> Result<(), LedgerError> {
        if block_a == block_b {
            return Err(LedgerError::InvalidInput(
                "deadlock requires two distinct blocks".into(),
            ));
        }
        for index in [block_a, block_b] {
            if chain.get(index).is_none() {
                return Err(LedgerError::block_not_found(index));
            }
        }

        let (tx1, tx2) = ids;
        chain.append_transaction(
            block_a,
            Transaction::stuck(tx1, block_a, block_b, format!("lock {} -> {}", block_a, block_b)),
        )?;
        chain.append_transaction(
            block_b,
            Transaction::stuck(tx2, block_b, block_a, format!("lock {} -> {}", block_b, block_a)),
        )?;
        Ok(())
    }
}
