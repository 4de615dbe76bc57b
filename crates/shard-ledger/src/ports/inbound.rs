//! # Inbound Ports
//!
//! API trait defining what the ledger service can do, plus the request
//! bodies the routing collaborator hands over.

use crate::algorithms::{ChainViolation, ThroughputReport};
use crate::domain::{
    AuditRecord, Block, BlockIndex, ConflictLog, LedgerError, Segment, SegmentAck, TxId,
    TxReceipt, TxStatusView,
};
use crate::ports::outbound::WorkloadSource;
use crate::service::ShardPartition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Single-shot transaction submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Source block index.
    pub source: BlockIndex,
    /// Target block index.
    pub target: BlockIndex,
    /// Payload; segmented when longer than the configured segment size.
    #[serde(alias = "message")]
    pub payload: String,
    /// Caller expects the transaction to cross shards.
    #[serde(default)]
    pub sharded_hint: bool,
}

impl TransactionRequest {
    /// Create a request without a sharded hint.
    pub fn new(source: BlockIndex, target: BlockIndex, payload: impl Into<String>) -> Self {
        Self {
            source,
            target,
            payload: payload.into(),
            sharded_hint: false,
        }
    }

    /// Mark the request as expected to be sharded.
    pub fn sharded(mut self) -> Self {
        self.sharded_hint = true;
        self
    }
}

/// Cartesian submission of one payload across source/target sets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutRequest {
    /// Source block indices.
    pub sources: Vec<BlockIndex>,
    /// Target block indices.
    pub targets: Vec<BlockIndex>,
    /// Shared payload.
    #[serde(alias = "message")]
    pub payload: String,
}

/// Manual shard reassignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardAssignmentRequest {
    /// Destination shard.
    pub shard_id: i64,
    /// Blocks to move; unknown indices are ignored.
    pub block_indices: Vec<BlockIndex>,
}

/// The two transactions staged by a simulated deadlock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlockPair {
    /// A → B, inserted into block A.
    pub tx1: TxId,
    /// B → A, inserted into block B.
    pub tx2: TxId,
}

/// Outcome of seeding blocks from a workload source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Blocks appended.
    pub appended: Vec<BlockIndex>,
    /// Workload ids rejected as duplicates.
    pub conflicts: Vec<String>,
}

/// Parse a JSON request body. Malformed JSON or missing fields map to
/// `InvalidInput`.
pub fn parse_request<T: DeserializeOwned>(body: &str) -> Result<T, LedgerError> {
    serde_json::from_str(body).map_err(|e| LedgerError::InvalidInput(e.to_string()))
}

/// Ledger API - inbound port.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Submit a transaction; returns immediately with a pending receipt.
    async fn submit_transaction(&self, request: TransactionRequest)
        -> Result<TxReceipt, LedgerError>;

    /// Submit one caller-driven segment.
    async fn submit_segment(&self, segment: Segment) -> Result<SegmentAck, LedgerError>;

    /// Submit several transactions; all are validated before any is queued.
    async fn submit_batch(
        &self,
        requests: Vec<TransactionRequest>,
    ) -> Result<Vec<TxId>, LedgerError>;

    /// Submit the cartesian product of sources and targets, hinted sharded.
    async fn submit_fan_out(&self, request: FanOutRequest) -> Result<Vec<TxId>, LedgerError>;

    /// Current status of a transaction.
    fn transaction_status(&self, tx_id: &str) -> Result<TxStatusView, LedgerError>;

    /// Wait until the transaction is terminal or `timeout` elapses.
    async fn await_terminal(
        &self,
        tx_id: &str,
        timeout: Duration,
    ) -> Result<TxStatusView, LedgerError>;

    /// Append an empty block for `originating_id`; `Conflict` on duplicates.
    fn append_block(&self, originating_id: &str) -> Result<Block, LedgerError>;

    /// Remove the tail block.
    fn remove_last_block(&self) -> Result<Block, LedgerError>;

    /// Snapshot of the whole chain.
    fn ledger(&self) -> Vec<Block>;

    /// Blocks currently assigned to `shard_id`.
    fn view_by_shard(&self, shard_id: i64) -> Result<Vec<Block>, LedgerError>;

    /// All shards at once.
    fn partition(&self) -> ShardPartition;

    /// Conflict log snapshot.
    fn conflicts(&self) -> ConflictLog;

    /// Move blocks to `shard_id`; returns how many moved.
    fn reassign_shard(&self, shard_id: i64, block_indices: &[BlockIndex])
        -> Result<usize, LedgerError>;

    /// Put every block back on shard 0.
    fn reset_shards(&self);

    /// Stage two mutually waiting transactions.
    fn simulate_deadlock(
        &self,
        block_a: BlockIndex,
        block_b: BlockIndex,
    ) -> Result<DeadlockPair, LedgerError>;

    /// Audit trail, malformed documents skipped.
    async fn audit_logs(&self) -> Result<Vec<AuditRecord>, LedgerError>;

    /// Sharded vs non-sharded averages from the audit trail.
    async fn throughput_report(&self) -> Result<ThroughputReport, LedgerError>;

    /// Diagnostic chain walk.
    fn verify_chain(&self) -> Result<(), ChainViolation>;

    /// Append one block per live workload id.
    async fn seed_from(&self, source: &dyn WorkloadSource) -> Result<SeedReport, LedgerError>;
}
