//! # Scenario Drivers
//!
//! Load generators comparing sharded and non-sharded submission:
//!
//! - **sharded**: `workers` concurrent submitters share the transactions,
//!   every request carries the sharded hint
//! - **non-sharded**: one transaction at a time, each awaited before the next
//! - **stress**: every transaction submitted and awaited concurrently
//!
//! Sources are drawn from 1..=5 and targets from 6..=10, so the ledger must
//! hold at least [`ScenarioConfig::required_blocks`] blocks first.

mod workload;

pub use workload::WorkloadGenerator;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ledger_telemetry::{
    ledger_span, log_block_event, metric_inc, time_histogram, BLOCKS_APPENDED, SCENARIO_DURATION,
    TRANSACTIONS_SUBMITTED,
};
use shard_ledger::{
    LedgerApi, LedgerError, LedgerService, TransactionRequest, TxId, TxStatus,
};
use tokio::task::JoinSet;
use tracing::{info, warn, Instrument};

use crate::container::{ScenarioConfig, ScenarioKind};

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Which scenario ran.
    pub kind: ScenarioKind,
    /// Transactions accepted by the service.
    pub submitted: usize,
    /// Transactions rejected at submission.
    pub rejected: usize,
    /// Reached `completed`.
    pub completed: usize,
    /// Reached `failed`.
    pub failed: usize,
    /// Still pending or in progress at the settle timeout.
    pub unsettled: usize,
    /// Wall-clock time from first submission to last settle.
    pub elapsed: Duration,
}

impl ScenarioReport {
    fn new(kind: ScenarioKind) -> Self {
        Self {
            kind,
            submitted: 0,
            rejected: 0,
            completed: 0,
            failed: 0,
            unsettled: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn tally(&mut self, status: Option<TxStatus>) {
        match status {
            Some(TxStatus::Completed) => self.completed += 1,
            Some(TxStatus::Failed) => self.failed += 1,
            _ => self.unsettled += 1,
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} submitted={} rejected={} completed={} failed={} unsettled={} in {:.2?}",
            self.kind.label(),
            self.submitted,
            self.rejected,
            self.completed,
            self.failed,
            self.unsettled,
            self.elapsed
        )
    }
}

/// Append filler blocks until the ledger holds at least `count` blocks.
///
/// Returns how many were appended.
pub fn ensure_blocks(service: &LedgerService, count: usize) -> Result<usize, LedgerError> {
    let missing = count.saturating_sub(service.ledger().len());
    let mut appended = 0;
    let mut n = 0usize;
    while appended < missing {
        match service.append_block(&format!("scenario-block-{}", n)) {
            Ok(block) => {
                metric_inc!(BLOCKS_APPENDED);
                log_block_event!(debug, "scenarios", "filler block appended", block.index, block.hash);
                appended += 1;
            }
            Err(LedgerError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
        n += 1;
    }
    if appended > 0 {
        info!("[runtime] appended {} filler blocks", appended);
    }
    Ok(appended)
}

/// Runs scenarios against a shared service.
pub struct ScenarioRunner {
    service: Arc<LedgerService>,
    config: ScenarioConfig,
    generator: WorkloadGenerator,
}

impl ScenarioRunner {
    /// Runner for `config`.
    pub fn new(service: Arc<LedgerService>, config: ScenarioConfig) -> Self {
        let generator = WorkloadGenerator::new(&config);
        Self {
            service,
            config,
            generator,
        }
    }

    /// Run one scenario.
    pub async fn run(&self, kind: ScenarioKind) -> Result<ScenarioReport, LedgerError> {
        ensure_blocks(&self.service, self.config.required_blocks())?;

        let span = ledger_span!("scenario", scenario = kind.label());
        let report = async {
            let _timer = time_histogram!(SCENARIO_DURATION.with_label_values(&[kind.label()]));
            let started = Instant::now();
            let mut report = match kind {
                ScenarioKind::Sharded => self.run_sharded().await,
                ScenarioKind::NonSharded => self.run_non_sharded().await,
                ScenarioKind::Stress => self.run_stress().await,
            };
            report.elapsed = started.elapsed();
            report
        }
        .instrument(span)
        .await;

        info!("[runtime] {}", report);
        Ok(report)
    }

    /// Split the transactions across `workers` concurrent submitters.
    async fn run_sharded(&self) -> ScenarioReport {
        let total = self.config.transactions;
        let workers = self.config.workers.max(1);
        let mut report = ScenarioReport::new(ScenarioKind::Sharded);

        let mut submitters = JoinSet::new();
        for worker in 0..workers {
            let share = total / workers + usize::from(worker < total % workers);
            let requests = self.generator.batch(share, true);
            let service = Arc::clone(&self.service);
            submitters.spawn(async move {
                let mut accepted = Vec::with_capacity(requests.len());
                let mut rejected = 0;
                for request in requests {
                    match submit(&service, request).await {
                        Some(id) => accepted.push(id),
                        None => rejected += 1,
                    }
                }
                (accepted, rejected)
            });
        }

        let mut ids = Vec::with_capacity(total);
        while let Some(joined) = submitters.join_next().await {
            match joined {
                Ok((accepted, rejected)) => {
                    ids.extend(accepted);
                    report.rejected += rejected;
                }
                Err(e) => warn!("[runtime] submitter task failed: {}", e),
            }
        }
        report.submitted = ids.len();

        for status in self.settle_all(ids).await {
            report.tally(status);
        }
        report
    }

    /// One at a time; each transaction settles before the next is sent.
    async fn run_non_sharded(&self) -> ScenarioReport {
        let mut report = ScenarioReport::new(ScenarioKind::NonSharded);
        for request in self.generator.batch(self.config.transactions, false) {
            match submit(&self.service, request).await {
                Some(id) => {
                    report.submitted += 1;
                    let status = settle(&self.service, &id, self.config.settle_timeout()).await;
                    report.tally(status);
                }
                None => report.rejected += 1,
            }
        }
        report
    }

    /// Everything at once.
    async fn run_stress(&self) -> ScenarioReport {
        let mut report = ScenarioReport::new(ScenarioKind::Stress);
        let timeout = self.config.settle_timeout();

        let mut tasks = JoinSet::new();
        for request in self.generator.batch(self.config.transactions, false) {
            let service = Arc::clone(&self.service);
            tasks.spawn(async move {
                match submit(&service, request).await {
                    Some(id) => Some(settle(&service, &id, timeout).await),
                    None => None,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(status)) => {
                    report.submitted += 1;
                    report.tally(status);
                }
                Ok(None) => report.rejected += 1,
                Err(e) => warn!("[runtime] stress task failed: {}", e),
            }
        }
        report
    }

    async fn settle_all(&self, ids: Vec<TxId>) -> Vec<Option<TxStatus>> {
        let timeout = self.config.settle_timeout();
        let mut waits = JoinSet::new();
        for id in ids {
            let service = Arc::clone(&self.service);
            waits.spawn(async move { settle(&service, &id, timeout).await });
        }
        let mut statuses = Vec::new();
        while let Some(joined) = waits.join_next().await {
            statuses.push(joined.unwrap_or(None));
        }
        statuses
    }
}

async fn submit(service: &LedgerService, request: TransactionRequest) -> Option<TxId> {
    match service.submit_transaction(request).await {
        Ok(receipt) => {
            metric_inc!(TRANSACTIONS_SUBMITTED);
            Some(receipt.transaction_id)
        }
        Err(e) => {
            warn!("[runtime] submission rejected: {}", e);
            None
        }
    }
}

async fn settle(service: &LedgerService, tx_id: &str, timeout: Duration) -> Option<TxStatus> {
    match service.await_terminal(tx_id, timeout).await {
        Ok(view) => Some(view.status),
        Err(e) => {
            warn!("[runtime] lost track of {}: {}", tx_id, e);
            None
        }
    }
}
