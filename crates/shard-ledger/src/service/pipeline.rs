//! # Transaction Pipeline
//!
//! Bounded job queue drained by a dispatcher that runs at most
//! `max_workers` jobs at once.
//!
//! ```text
//! submit ──try_send──→ [queue] ──dispatcher──→ semaphore ──→ process()
//!                                                             │
//!   in-progress → classify → sleep → reassemble → finalize ───┘
//! ```

use super::LedgerCore;
use crate::algorithms::{segment_payload, SyntheticMetrics};
use crate::domain::{
    AuditRecord, BlockIndex, LedgerError, PipelineConfig, SegmentOutcome, Transaction, TxId,
    TxKind, TxStatus, AUDIT_SCHEMA_VERSION,
};
use crate::ports::inbound::TransactionRequest;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// One accepted submission.
#[derive(Debug)]
pub(crate) struct Job {
    pub(crate) tx_id: TxId,
    pub(crate) request: TransactionRequest,
}

/// Why a job could not be queued.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EnqueueError {
    Full,
    Closed,
}

/// Queue front-end and dispatcher handle.
pub struct TransactionPipeline {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    capacity: usize,
}

impl TransactionPipeline {
    /// Spawn the dispatcher. Must run inside a Tokio runtime.
    pub(crate) fn start(core: Arc<LedgerCore>, config: &PipelineConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let workers = Arc::new(Semaphore::new(config.max_workers));
        let dispatcher = tokio::spawn(dispatch(core, receiver, workers));

        Self {
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
            capacity: config.queue_capacity,
        }
    }

    /// Queue a job without waiting.
    pub(crate) fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(EnqueueError::Closed)?;
        sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Queue a whole batch or nothing.
    ///
    /// Slots for every request are reserved before `register` assigns any
    /// id, so a full queue leaves no trace of the batch.
    pub(crate) fn enqueue_batch<F>(
        &self,
        requests: Vec<TransactionRequest>,
        mut register: F,
    ) -> Result<Vec<TxId>, EnqueueError>
    where
        F: FnMut() -> TxId,
    {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(EnqueueError::Closed)?;
        let permits = sender.try_reserve_many(requests.len()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(()) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(()) => EnqueueError::Closed,
        })?;

        let mut ids = Vec::with_capacity(requests.len());
        for (permit, request) in permits.zip(requests) {
            let tx_id = register();
            permit.send(Job {
                tx_id: tx_id.clone(),
                request,
            });
            ids.push(tx_id);
        }
        Ok(ids)
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map(|s| s.max_capacity() - s.capacity())
            .unwrap_or(0)
    }

    /// Close the queue. Queued and in-flight jobs still run; the returned
    /// handle resolves once the dispatcher has drained the queue.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        self.sender.lock().take();
        self.dispatcher.lock().take()
    }
}

async fn dispatch(core: Arc<LedgerCore>, mut receiver: mpsc::Receiver<Job>, workers: Arc<Semaphore>) {
    debug!("[ledger] pipeline dispatcher started");
    while let Some(job) = receiver.recv().await {
        let permit = match workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("[ledger] worker pool closed, dropping {}", job.tx_id);
                core.status.fail(&job.tx_id);
                continue;
            }
        };
        let core = core.clone();
        tokio::spawn(async move {
            core.process(job).await;
            drop(permit);
        });
    }
    debug!("[ledger] pipeline dispatcher stopped");
}

impl LedgerCore {
    /// Run one job to a terminal state.
    pub(crate) async fn process(self: Arc<Self>, job: Job) {
        let started = Instant::now();
        let Job { tx_id, request } = job;
        self.status.transition(&tx_id, TxStatus::InProgress);

        let source = request.source;
        let mut target = request.target;
        let mut decision = self.ledger.router().classify(source, target);
        if request.sharded_hint && decision.kind == TxKind::NonSharded {
            target = (target + 1) % self.config.ledger.target_wrap;
            decision = self.ledger.router().classify(source, target);
            debug!(
                "[ledger] {} expected sharded, target adjusted to {} ({})",
                tx_id, target, decision.kind
            );
        }
        let kind = decision.kind;
        self.status.set_kind(&tx_id, kind);

        tokio::time::sleep(self.latency.processing_delay(kind)).await;

        let payload = if request.payload.len() > self.config.ledger.segment_size {
            match self
                .clone()
                .reassemble(&tx_id, decision.source_shard, &request.payload)
                .await
            {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("[ledger] {} reassembly failed: {}", tx_id, e);
                    self.assembler.discard(&tx_id);
                    self.status.fail(&tx_id);
                    return;
                }
            }
        } else {
            request.payload
        };

        let retry = &self.config.pipeline.retry;
        for attempt in 0..retry.max_attempts {
            let exec_time_ms = started.elapsed().as_secs_f64() * 1000.0;
            match self.finalize(&tx_id, source, target, &payload, kind, exec_time_ms) {
                Ok(()) => {
                    info!(
                        "[ledger] {} completed {} -> {} ({}, {:.1}ms)",
                        tx_id, source, target, kind, exec_time_ms
                    );
                    self.emit_audit(&tx_id, source, target, kind, &payload, exec_time_ms)
                        .await;
                    return;
                }
                Err(e) => {
                    if attempt + 1 < retry.max_attempts {
                        let backoff = retry.backoff(attempt);
                        debug!(
                            "[ledger] {} attempt {} failed ({}), retrying in {:?}",
                            tx_id,
                            attempt + 1,
                            e,
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                    } else {
                        warn!(
                            "[ledger] {} failed after {} attempts: {}",
                            tx_id, retry.max_attempts, e
                        );
                    }
                }
            }
        }
        self.status.fail(&tx_id);
    }

    /// Split, feed the segments to the assembler concurrently and return
    /// the reconstructed payload.
    async fn reassemble(
        self: Arc<Self>,
        tx_id: &str,
        shard_id: crate::domain::ShardId,
        payload: &str,
    ) -> Result<String, LedgerError> {
        let segments = segment_payload(tx_id, shard_id, payload, self.config.ledger.segment_size);
        debug!("[ledger] {} split into {} segments", tx_id, segments.len());

        let mut tasks = JoinSet::new();
        for segment in segments {
            let core = self.clone();
            tasks.spawn(async move { core.assembler.submit(segment, core.clock.now()) });
        }

        let mut rebuilt = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(SegmentOutcome::Complete(payload))) => rebuilt = Some(payload),
                Ok(Ok(SegmentOutcome::Awaiting { .. })) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(LedgerError::InvalidInput(format!("segment task: {}", e))),
            }
        }
        rebuilt.ok_or_else(|| LedgerError::InvalidInput(format!("{} never completed", tx_id)))
    }

    /// Append the completed transaction and mark it completed, all under
    /// the ledger lock.
    pub(crate) fn finalize(
        &self,
        tx_id: &str,
        source: BlockIndex,
        target: BlockIndex,
        payload: &str,
        kind: TxKind,
        exec_time_ms: f64,
    ) -> Result<(), LedgerError> {
        self.ledger.with_chain_mut(|chain| {
            if chain.get(target).is_none() {
                return Err(LedgerError::block_not_found(target));
            }
            chain.append_transaction(
                source,
                Transaction::completed(
                    tx_id.to_string(),
                    source,
                    target,
                    payload.to_string(),
                    kind,
                    exec_time_ms,
                ),
            )?;
            self.status.complete(tx_id, kind, payload);
            Ok(())
        })
    }

    /// Write the audit record. Sink failures are logged only.
    pub(crate) async fn emit_audit(
        &self,
        tx_id: &str,
        source: BlockIndex,
        target: BlockIndex,
        kind: TxKind,
        payload: &str,
        exec_time_ms: f64,
    ) {
        let metrics = SyntheticMetrics::compute(exec_time_ms, self.latency.network_cost(kind));
        let record = AuditRecord {
            schema_version: AUDIT_SCHEMA_VERSION,
            tx_id: tx_id.to_string(),
            source,
            target,
            kind,
            message: payload.to_string(),
            exec_time_ms: metrics.exec_time_ms,
            finality_ms: metrics.finality_ms,
            propagation_ms: metrics.propagation_ms,
            tps: metrics.tps,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.audit.record(&record).await {
            warn!("[ledger] audit write for {} failed: {}", tx_id, e);
        }
    }
}
