//! # Shard Ledger
//!
//! A simulated sharded ledger: an append-only chain of blocks holding
//! transactions, routed across logical shards, with concurrent submission,
//! payload segmentation and duplicate detection.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Compare the apparent throughput of sharded and non-sharded work and
//! demonstrate concurrency hazards:
//! - Deterministic identifier-to-shard routing
//! - Hash-linked blocks kept consistent under a single writer lock
//! - Bounded asynchronous pipeline with a forward-only status machine
//! - Segment reassembly independent of arrival order
//! - Duplicate identifier rejection and a staged deadlock
//!
//! Finality and TPS figures are synthetic estimates.
//!
//! ## Module Structure
//!
//! ```text
//! shard-ledger/
//! ├── domain/          # Block, Transaction, Segment, AuditRecord, configs
//! ├── algorithms/      # Hash chain, shard router, segmentation, cost model
//! ├── ports/           # LedgerApi + AuditSink, WorkloadSource, LatencyModel, TimeSource
//! ├── adapters/        # In-memory / JSON-lines audit log, latency, workloads
//! └── service/         # LedgerService, pipeline, assembler, conflicts, views
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    FixedLatency, InMemoryAuditLog, JsonLinesAuditLog, RandomLatency, StaticWorkloadSource,
};
pub use algorithms::{
    compute_hash, verify, verify_chain, ChainViolation, KindSummary, ShardRouter,
    ThroughputReport,
};
pub use domain::{
    AuditRecord, Block, BlockIndex, ConflictLog, ConflictRecord, LatencyConfig, LedgerConfig,
    LedgerError, PipelineConfig, RetryPolicy, RoutingDecision, Segment, SegmentAck, ShardId,
    TenantRule, Transaction, TxId, TxKind, TxReceipt, TxStatus, TxStatusView,
};
pub use ports::{
    parse_request, AuditSink, DeadlockPair, FanOutRequest, LatencyModel, LedgerApi,
    SeedReport, ShardAssignmentRequest, SystemTimeSource, TimeSource, TransactionRequest,
    WorkloadSource,
};
pub use service::{LedgerDependencies, LedgerService, LedgerServiceConfig, ShardPartition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
