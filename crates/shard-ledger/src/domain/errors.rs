//! # Domain Errors
//!
//! Error taxonomy for the sharded ledger.
//!
//! Synchronous rejections (`InvalidInput`, `Conflict`, `EmptyLedger`,
//! `InvalidShard`, `QueueFull`) never touch shared state. Asynchronous
//! failures after acceptance surface only as a `failed` transaction status.

use thiserror::Error;

/// Shard identifier.
pub type ShardId = u32;

/// Position of a block in the ledger.
pub type BlockIndex = u64;

/// Time-derived transaction identifier (`tx-<unix-nanos>`).
pub type TxId = String;

/// Ledger error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed submission body or missing required field.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Identifier already present in the ledger.
    #[error("Conflict: identifier {0} already exists")]
    Conflict(String),

    /// Referenced block, shard or transaction is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Structural removal attempted on an empty ledger.
    #[error("Ledger is empty")]
    EmptyLedger,

    /// Shard id outside `[0, shard_count)`.
    #[error("Invalid shard {shard_id}: expected < {shard_count}")]
    InvalidShard {
        /// Requested shard
        shard_id: i64,
        /// Configured shard count
        shard_count: ShardId,
    },

    /// Pipeline queue cannot take the submission. Nothing was queued.
    #[error("Pipeline queue full (capacity {capacity}, {requested} slots requested)")]
    QueueFull {
        /// Queue capacity
        capacity: usize,
        /// Slots the rejected call needed
        requested: usize,
    },

    /// Persisted audit document failed schema validation.
    #[error("Malformed audit record: {0}")]
    MalformedRecord(String),

    /// Audit sink failure.
    #[error("Audit sink error: {0}")]
    Audit(String),
}

impl LedgerError {
    /// Shorthand for a missing block.
    pub fn block_not_found(index: BlockIndex) -> Self {
        Self::NotFound(format!("block {}", index))
    }

    /// Shorthand for a missing transaction.
    pub fn tx_not_found(tx_id: &str) -> Self {
        Self::NotFound(format!("transaction {}", tx_id))
    }

    /// Whether the error was raised before any shared state was touched.
    pub fn is_synchronous_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::Conflict(_)
                | Self::EmptyLedger
                | Self::InvalidShard { .. }
                | Self::QueueFull { .. }
        )
    }
}
