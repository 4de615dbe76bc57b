//! # Domain Value Objects
//!
//! Immutable value types for the ledger pipeline.

use super::errors::{ShardId, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction status state machine.
///
/// ```text
/// [pending] ──worker──→ [in-progress] ──finalize──→ [completed]
///     │                       │
///     └───────────────────────┴────────────────────→ [failed]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TxStatus {
    /// Accepted, waiting for a worker.
    #[default]
    Pending,
    /// Picked up by a worker or awaiting outstanding segments.
    InProgress,
    /// Finalized into the ledger.
    Completed,
    /// Source block missing at finalize time.
    Failed,
}

impl TxStatus {
    /// Check if transition to next state is valid. Status only moves forward.
    pub fn can_transition_to(&self, next: TxStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::InProgress) => true,
            (Self::Pending, Self::Completed) => true,
            (Self::Pending, Self::Failed) => true,
            (Self::InProgress, Self::Completed) => true,
            (Self::InProgress, Self::Failed) => true,
            _ => false,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing classification of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TxKind {
    /// Source and target live on different shards.
    #[serde(rename = "Sharded")]
    Sharded,
    /// Source and target share a shard.
    #[default]
    #[serde(rename = "Non-Sharded")]
    NonSharded,
}

impl TxKind {
    /// Classify from a pair of shards.
    pub fn from_shards(source: ShardId, target: ShardId) -> Self {
        if source != target {
            Self::Sharded
        } else {
            Self::NonSharded
        }
    }

    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sharded => "Sharded",
            Self::NonSharded => "Non-Sharded",
        }
    }

    /// Parse a wire label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "sharded" => Some(Self::Sharded),
            "non-sharded" | "nonsharded" => Some(Self::NonSharded),
            _ => None,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a source/target pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutingDecision {
    /// Shard of the source block.
    pub source_shard: ShardId,
    /// Shard of the target block.
    pub target_shard: ShardId,
    /// Sharded iff the shards differ.
    pub kind: TxKind,
}

/// Outcome of handing one segment to the assembler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// More segments outstanding.
    Awaiting {
        /// Segments buffered so far
        received: u32,
        /// Segments expected
        total: u32,
    },
    /// All segments arrived; payload reconstructed in index order.
    Complete(String),
}

/// Acknowledgement returned to a segment submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SegmentAck {
    /// Buffered, transaction still incomplete.
    Received {
        /// Transaction id
        transaction_id: TxId,
        /// Segments buffered so far
        received: u32,
        /// Segments expected
        total: u32,
    },
    /// Final segment arrived and the transaction was finalized.
    Completed {
        /// Transaction id
        transaction_id: TxId,
    },
}

/// Receipt returned immediately on submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Assigned transaction id.
    pub transaction_id: TxId,
    /// Always `pending` at submission time.
    pub status: TxStatus,
}

/// Status query result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxStatusView {
    /// Transaction id.
    pub transaction_id: TxId,
    /// Current status.
    pub status: TxStatus,
    /// Classification, once known.
    pub kind: Option<TxKind>,
    /// Finalized payload, only for completed transactions.
    pub payload: Option<String>,
}
