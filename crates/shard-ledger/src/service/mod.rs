//! # Ledger Service
//!
//! One struct owning the ledger, router, pipeline, assembler, conflict
//! tracker and ports. Construct one per process (or per test) and share it
//! behind an `Arc`.
//!
//! ## Locks
//!
//! Ledger, status map, segment buffers and conflict log each have their own
//! `parking_lot` mutex. When nested, the ledger lock is always taken first.
//! No lock is held across an `.await`.

mod api;
mod assembler;
mod conflicts;
mod ledger;
mod pipeline;
mod shard_view;
mod status;

pub use assembler::SegmentAssembler;
pub use conflicts::ConflictTracker;
pub use ledger::{Chain, Ledger};
pub use pipeline::TransactionPipeline;
pub use shard_view::{partition, view_by_shard, ShardPartition, ShardSnapshot};
pub use status::{StatusTracker, TxIdGenerator, TxOrigin};

use crate::adapters::{InMemoryAuditLog, RandomLatency};
use crate::algorithms::ShardRouter;
use crate::domain::{LatencyConfig, LedgerConfig, LedgerError, PipelineConfig, TxId, TxStatus};
use crate::ports::outbound::{AuditSink, LatencyModel, SystemTimeSource, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Service configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerServiceConfig {
    /// Routing, segmentation and conflict log settings.
    pub ledger: LedgerConfig,
    /// Queue, workers, retries and GC.
    pub pipeline: PipelineConfig,
}

impl LedgerServiceConfig {
    /// Small, fast configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            ledger: LedgerConfig::for_testing(),
            pipeline: PipelineConfig::for_testing(),
        }
    }

    /// Validate both halves.
    pub fn validate(&self) -> Result<(), LedgerError> {
        self.ledger.validate()?;
        self.pipeline.validate()
    }
}

/// Outbound port implementations.
#[derive(Clone)]
pub struct LedgerDependencies {
    /// Audit trail.
    pub audit: Arc<dyn AuditSink>,
    /// Simulated latency.
    pub latency: Arc<dyn LatencyModel>,
    /// Clock for segment buffer expiry.
    pub clock: Arc<dyn TimeSource>,
}

impl LedgerDependencies {
    /// In-memory audit log, random latency and the system clock.
    pub fn in_memory(latency: LatencyConfig) -> Self {
        Self {
            audit: Arc::new(InMemoryAuditLog::new()),
            latency: Arc::new(RandomLatency::new(latency)),
            clock: Arc::new(SystemTimeSource),
        }
    }
}

/// State shared between the facade and pipeline workers.
pub(crate) struct LedgerCore {
    pub(crate) ledger: Ledger,
    pub(crate) status: StatusTracker,
    pub(crate) assembler: SegmentAssembler,
    pub(crate) conflicts: ConflictTracker,
    pub(crate) ids: TxIdGenerator,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) latency: Arc<dyn LatencyModel>,
    pub(crate) clock: Arc<dyn TimeSource>,
    pub(crate) config: LedgerServiceConfig,
}

impl LedgerCore {
    /// Purge expired segment buffers and fail their transactions.
    pub(crate) fn gc_segments(&self) -> Vec<TxId> {
        let expired = self.assembler.gc_expired(self.clock.now());
        self.fail_evicted(&expired, "expired");
        expired
    }

    /// Drop terminal status entries past their retention.
    pub(crate) fn gc_statuses(&self) -> usize {
        let retention = self.config.pipeline.status_retention().as_millis() as u64;
        self.status.sweep_terminal(self.clock.now(), retention)
    }

    pub(crate) fn fail_evicted(&self, ids: &[TxId], reason: &str) {
        for id in ids {
            warn!("[ledger] segment buffer for {} {}", id, reason);
            self.status.fail(id);
        }
    }
}

/// The ledger service. Implements [`crate::ports::LedgerApi`].
pub struct LedgerService {
    pub(crate) core: Arc<LedgerCore>,
    pub(crate) pipeline: TransactionPipeline,
}

impl LedgerService {
    /// Build the service and start its pipeline dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: LedgerServiceConfig, deps: LedgerDependencies) -> Result<Self, LedgerError> {
        config.validate()?;
        let router = ShardRouter::from_config(&config.ledger)?;

        let core = Arc::new(LedgerCore {
            ledger: Ledger::new(router),
            status: StatusTracker::new(),
            assembler: SegmentAssembler::new(&config.pipeline),
            conflicts: ConflictTracker::new(config.ledger.conflict_log_capacity),
            ids: TxIdGenerator::new(),
            audit: deps.audit,
            latency: deps.latency,
            clock: deps.clock,
            config,
        });
        let pipeline = TransactionPipeline::start(core.clone(), &core.config.pipeline);

        info!(
            "[ledger] service started: {} shards, queue {}, {} workers",
            core.config.ledger.shard_count,
            core.config.pipeline.queue_capacity,
            core.config.pipeline.max_workers
        );
        Ok(Self { core, pipeline })
    }

    /// Service configuration.
    pub fn config(&self) -> &LedgerServiceConfig {
        &self.core.config
    }

    /// Shard router.
    pub fn router(&self) -> &ShardRouter {
        self.core.ledger.router()
    }

    /// Pipeline handle (queue depth, shutdown).
    pub fn pipeline(&self) -> &TransactionPipeline {
        &self.pipeline
    }

    /// Number of transactions with buffered segments.
    pub fn pending_segment_buffers(&self) -> usize {
        self.core.assembler.len()
    }

    /// Tracked transactions per status.
    pub fn status_counts(&self) -> HashMap<TxStatus, usize> {
        self.core.status.counts()
    }

    /// Run one GC pass now.
    pub fn gc_segments(&self) -> Vec<TxId> {
        self.core.gc_segments()
    }

    /// Run one terminal-status sweep now. Returns how many entries were
    /// dropped.
    pub fn gc_statuses(&self) -> usize {
        self.core.gc_statuses()
    }

    /// Periodic GC until the service is dropped.
    pub fn spawn_gc_task(&self) -> JoinHandle<()> {
        let core = Arc::downgrade(&self.core);
        let period = self.core.config.pipeline.gc_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(core) = core.upgrade() else {
                    break;
                };
                let purged = core.gc_segments();
                if !purged.is_empty() {
                    info!("[ledger] gc purged {} segment buffers", purged.len());
                }
                let dropped = core.gc_statuses();
                if dropped > 0 {
                    debug!("[ledger] gc dropped {} terminal statuses", dropped);
                }
            }
        })
    }

    /// Close the queue; in-flight jobs run to completion.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        info!("[ledger] pipeline shutting down");
        self.pipeline.shutdown()
    }
}
