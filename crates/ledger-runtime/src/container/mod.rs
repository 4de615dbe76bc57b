//! # Service Container
//!
//! Builds the ledger service and its outbound adapters from a
//! [`RuntimeConfig`].
//!
//! - Audit trail: JSON-lines file when `audit_path` is set, in-memory otherwise,
//!   always wrapped by [`MetricsAuditSink`]
//! - Latency: random ranges from `LatencyConfig`
//! - Clock: system time

pub mod config;

pub use config::{ConfigError, RuntimeConfig, ScenarioConfig, ScenarioKind};

use std::sync::Arc;

use shard_ledger::ports::AuditSink;
use shard_ledger::{
    InMemoryAuditLog, JsonLinesAuditLog, LedgerDependencies, LedgerError, LedgerService,
    RandomLatency, SystemTimeSource,
};
use tracing::info;

use crate::adapters::MetricsAuditSink;

/// Wired service plus the handles the runtime needs.
pub struct LedgerContainer {
    /// The ledger service.
    pub service: Arc<LedgerService>,
    /// Runtime configuration.
    pub config: RuntimeConfig,
}

impl LedgerContainer {
    /// Wire adapters and start the service. Requires a Tokio runtime.
    pub fn new(config: RuntimeConfig) -> Result<Self, LedgerError> {
        let inner: Arc<dyn AuditSink> = match &config.audit_path {
            Some(path) => {
                info!("[runtime] audit trail at {}", path.display());
                Arc::new(JsonLinesAuditLog::new(path))
            }
            None => {
                info!("[runtime] audit trail in memory");
                Arc::new(InMemoryAuditLog::new())
            }
        };

        let deps = LedgerDependencies {
            audit: Arc::new(MetricsAuditSink::new(inner)),
            latency: Arc::new(RandomLatency::new(config.latency.clone())),
            clock: Arc::new(SystemTimeSource),
        };
        let service = Arc::new(LedgerService::new(config.service.clone(), deps)?);

        Ok(Self { service, config })
    }
}
