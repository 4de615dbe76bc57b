//! # Ledger Runtime
//!
//! Startup, scenario execution, reporting and graceful shutdown around one
//! [`LedgerContainer`].

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use ledger_telemetry::log_event;
use parking_lot::Mutex;
use shard_ledger::{LedgerApi, LedgerService, StaticWorkloadSource, ThroughputReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::{LedgerContainer, RuntimeConfig};
use crate::display::{render_chain, render_conflicts};
use crate::scenarios::{ScenarioReport, ScenarioRunner};
use crate::wiring::spawn_maintenance;

/// The runtime orchestrating the ledger service and its background tasks.
pub struct LedgerRuntime {
    container: LedgerContainer,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl LedgerRuntime {
    /// Wire the service. Requires a Tokio runtime.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let container = LedgerContainer::new(config).context("failed to build ledger service")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            shutdown_rx,
            maintenance: Mutex::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.container.config
    }

    /// Shared service handle.
    pub fn service(&self) -> Arc<LedgerService> {
        Arc::clone(&self.container.service)
    }

    /// Startup sequence:
    ///
    /// 1. Rehydrate the audit trail and log what it holds
    /// 2. Seed blocks from the configured workload ids
    /// 3. Start segment GC and the metrics monitor
    pub async fn start(&self) -> Result<()> {
        let config = self.config();
        info!("===========================================");
        info!("  Shard Ledger Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "  {} shards, segment size {}, {} workers",
            config.service.ledger.shard_count,
            config.service.ledger.segment_size,
            config.service.pipeline.max_workers
        );
        info!("===========================================");

        let service = self.service();
        let history = service
            .audit_logs()
            .await
            .context("failed to load audit trail")?;
        if !history.is_empty() {
            info!("[runtime] rehydrated {} audit records", history.len());
        }

        if !config.seed_workloads.is_empty() {
            let source = StaticWorkloadSource::new(config.seed_workloads.iter().cloned());
            let report = service
                .seed_from(&source)
                .await
                .context("failed to seed workloads")?;
            ledger_telemetry::BLOCKS_APPENDED.inc_by(report.appended.len() as f64);
            for id in &report.conflicts {
                warn!("[runtime] workload {} already on the ledger", id);
            }
        }

        let handle = spawn_maintenance(
            Arc::clone(&service),
            config.monitor_interval(),
            self.shutdown_rx.clone(),
        );
        *self.maintenance.lock() = Some(handle);

        log_event!(
            info,
            "runtime",
            "[runtime] ready",
            blocks = service.ledger().len(),
            scenarios = config.scenarios.run.len()
        );
        Ok(())
    }

    /// Run every configured scenario in order.
    pub async fn run_scenarios(&self) -> Result<Vec<ScenarioReport>> {
        let runner = ScenarioRunner::new(self.service(), self.config().scenarios.clone());
        let mut reports = Vec::new();
        for kind in &self.config().scenarios.run {
            let report = runner
                .run(*kind)
                .await
                .with_context(|| format!("scenario {} failed", kind.label()))?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Chain, shard partition, conflicts, throughput and chain verification.
    pub async fn summary(&self, reports: &[ScenarioReport]) -> Result<String> {
        let service = self.service();
        let throughput: ThroughputReport = service
            .throughput_report()
            .await
            .context("failed to build throughput report")?;

        let mut out = String::new();
        let _ = writeln!(out, "== Ledger ==");
        out.push_str(&render_chain(&service.ledger()));
        let _ = writeln!(out, "\n== Shards ==");
        let _ = write!(out, "{}", service.partition());
        let _ = writeln!(out, "\n== Conflicts ==");
        out.push_str(&render_conflicts(&service.conflicts()));
        if !reports.is_empty() {
            let _ = writeln!(out, "\n== Scenarios ==");
            for report in reports {
                let _ = writeln!(out, "{}", report);
            }
        }
        let _ = writeln!(out, "\n== Throughput ==");
        let _ = write!(out, "{}", throughput);
        let _ = writeln!(out, "\n== Integrity ==");
        match service.verify_chain() {
            Ok(()) => {
                let _ = writeln!(out, "chain verified");
            }
            Err(violation) => {
                let _ = writeln!(out, "chain violation: {}", violation);
            }
        }
        Ok(out)
    }

    /// Graceful shutdown.
    ///
    /// 1. Signal background tasks
    /// 2. Close the pipeline queue and wait for in-flight jobs
    /// 3. Wait for the maintenance loop's final metrics flush
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        if let Some(dispatcher) = self.container.service.shutdown() {
            if let Err(e) = dispatcher.await {
                error!("[runtime] pipeline dispatcher ended abnormally: {}", e);
            }
        }

        let maintenance = self.maintenance.lock().take();
        if let Some(handle) = maintenance {
            if let Err(e) = handle.await {
                error!("[runtime] maintenance task ended abnormally: {}", e);
            }
        }

        info!("Shutdown complete");
    }
}
