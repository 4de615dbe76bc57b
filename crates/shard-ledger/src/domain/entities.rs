//! # Domain Entities
//!
//! Blocks, transactions, segments and conflict records.

use super::errors::{BlockIndex, LedgerError, ShardId, TxId};
use super::value_objects::{TxKind, TxStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Previous-hash sentinel of the first block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Version carried by the first block.
pub const GENESIS_VERSION: u64 = 1;

/// Originating id used when a block must be created implicitly.
pub const GENESIS_ORIGIN: &str = "genesis";

/// Canonical timestamp rendering used for hashing and display.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A ledger block.
///
/// `hash` covers index, timestamp, transactions and `previous_hash`.
/// `shard_id` and `version` are deliberately outside the hash so shard
/// reassignment never disturbs chain linkage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain.
    pub index: BlockIndex,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Workload or entity this block was created for.
    pub originating_id: String,
    /// Transactions finalized into this block.
    pub transactions: Vec<Transaction>,
    /// Hash of the predecessor, or the genesis sentinel.
    pub previous_hash: String,
    /// Content hash.
    pub hash: String,
    /// Chain version, +1 per appended block.
    pub version: u64,
    /// Owning shard.
    pub shard_id: ShardId,
}

impl Block {
    /// Whether this block or one of its transactions carries `identifier`.
    pub fn carries_identifier(&self, identifier: &str) -> bool {
        self.originating_id == identifier
            || self
                .transactions
                .iter()
                .any(|tx| tx.transaction_id == identifier)
    }

    /// Find a transaction by id.
    pub fn transaction(&self, tx_id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.transaction_id == tx_id)
    }
}

/// A transaction between two blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique, time-derived id.
    pub transaction_id: TxId,
    /// Source block index.
    pub source: BlockIndex,
    /// Target block index.
    pub target: BlockIndex,
    /// Full (reassembled) payload.
    pub payload: String,
    /// Lifecycle status.
    pub status: TxStatus,
    /// Routing classification.
    pub kind: TxKind,
    /// Measured processing time in milliseconds.
    pub exec_time_ms: f64,
    /// Finalization time.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a completed transaction ready to be appended.
    pub fn completed(
        transaction_id: TxId,
        source: BlockIndex,
        target: BlockIndex,
        payload: String,
        kind: TxKind,
        exec_time_ms: f64,
    ) -> Self {
        Self {
            transaction_id,
            source,
            target,
            payload,
            status: TxStatus::Completed,
            kind,
            exec_time_ms,
            timestamp: Utc::now(),
        }
    }

    /// Build a pending transaction that is never finalized.
    pub fn stuck(transaction_id: TxId, source: BlockIndex, target: BlockIndex, payload: String) -> Self {
        Self {
            transaction_id,
            source,
            target,
            payload,
            status: TxStatus::Pending,
            kind: TxKind::NonSharded,
            exec_time_ms: 0.0,
            timestamp: Utc::now(),
        }
    }
}

/// One ordered chunk of a larger payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Transaction this chunk belongs to.
    pub transaction_id: TxId,
    /// Shard the chunk was produced on.
    pub shard_id: ShardId,
    /// Position, `0..total_segments`.
    pub segment_index: u32,
    /// Number of chunks making up the payload.
    pub total_segments: u32,
    /// Chunk data.
    #[serde(alias = "data")]
    pub chunk: String,
}

impl Segment {
    /// Validate the segment in isolation.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.transaction_id.trim().is_empty() {
            return Err(LedgerError::InvalidInput("missing transaction_id".into()));
        }
        if self.total_segments == 0 {
            return Err(LedgerError::InvalidInput("total_segments must be positive".into()));
        }
        if self.segment_index >= self.total_segments {
            return Err(LedgerError::InvalidInput(format!(
                "segment_index {} out of range for {} segments",
                self.segment_index, self.total_segments
            )));
        }
        Ok(())
    }
}

/// A rejected duplicate submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Identifier that already existed.
    pub identifier: String,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Human readable description.
    pub message: String,
}

impl ConflictRecord {
    /// Create a record for `identifier` detected now.
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            detected_at: Utc::now(),
            message: format!("Concurrency conflict detected for identifier: {}", identifier),
        }
    }
}

/// Snapshot of the conflict ring buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictLog {
    /// Conflicts detected since start, including evicted ones.
    pub total: u64,
    /// Retained entries, oldest first.
    pub entries: Vec<ConflictRecord>,
}
