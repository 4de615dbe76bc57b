//! # Ledger API Implementation
//!
//! Implements the `LedgerApi` trait for `LedgerService`.

use super::pipeline::{EnqueueError, Job};
use super::shard_view::{partition, view_by_shard, ShardPartition};
use super::status::TxOrigin;
use super::{LedgerCore, LedgerService};
use crate::algorithms::{verify_chain, ChainViolation, ThroughputReport};
use crate::domain::{
    AuditRecord, Block, BlockIndex, ConflictLog, LedgerError, Segment, SegmentAck,
    SegmentOutcome, Transaction, TxId, TxKind, TxReceipt, TxStatus, TxStatusView,
};
use crate::ports::inbound::{
    DeadlockPair, FanOutRequest, LedgerApi, SeedReport, TransactionRequest,
};
use crate::ports::outbound::WorkloadSource;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

fn validate_request(request: &TransactionRequest) -> Result<(), LedgerError> {
    if request.payload.is_empty() {
        return Err(LedgerError::InvalidInput("payload must not be empty".into()));
    }
    Ok(())
}

impl LedgerService {
    /// Register and queue one validated request.
    fn enqueue(&self, request: TransactionRequest) -> Result<TxId, LedgerError> {
        let tx_id = self.core.ids.next_id();
        self.core
            .status
            .insert_pending(&tx_id, TxOrigin::Pipeline, self.core.clock.now());

        let job = Job {
            tx_id: tx_id.clone(),
            request,
        };
        match self.pipeline.enqueue(job) {
            Ok(()) => {
                debug!("[ledger] {} queued", tx_id);
                Ok(tx_id)
            }
            Err(EnqueueError::Full) => {
                self.core.status.remove(&tx_id);
                warn!("[ledger] queue full, rejecting submission");
                Err(LedgerError::QueueFull {
                    capacity: self.pipeline.capacity(),
                    requested: 1,
                })
            }
            Err(EnqueueError::Closed) => {
                self.core.status.remove(&tx_id);
                Err(LedgerError::InvalidInput("pipeline is shut down".into()))
            }
        }
    }
}

impl LedgerCore {
    /// Caller-driven segment handling.
    async fn accept_segment(&self, segment: Segment) -> Result<SegmentAck, LedgerError> {
        segment.validate()?;
        self.ledger.router().check_shard(i64::from(segment.shard_id))?;
        let tx_id = segment.transaction_id.clone();

        let now = self.clock.now();
        let registered = self.ledger.with_chain(|chain| {
            if self.conflicts.check_and_log(chain, &tx_id) {
                return Err(LedgerError::Conflict(tx_id.clone()));
            }
            match self.status.origin_and_status(&tx_id) {
                None => {
                    Ok(self.status.insert_pending(&tx_id, TxOrigin::Caller, now))
                }
                Some((TxOrigin::Caller, status)) if !status.is_terminal() => Ok(false),
                Some(_) => {
                    self.conflicts.record(&tx_id);
                    Err(LedgerError::Conflict(tx_id.clone()))
                }
            }
        })?;
        if registered {
            debug!("[ledger] {} registered from first segment", tx_id);
        }

        let outcome = self.assembler.submit(segment, self.clock.now())?;
        let evicted = self.assembler.enforce_max_pending();
        self.fail_evicted(&evicted, "evicted (buffer limit)");

        match outcome {
            SegmentOutcome::Awaiting { received, total } => {
                self.status.transition(&tx_id, TxStatus::InProgress);
                Ok(SegmentAck::Received {
                    transaction_id: tx_id,
                    received,
                    total,
                })
            }
            SegmentOutcome::Complete(payload) => {
                let started = self.status.registered_at(&tx_id).unwrap_or_else(|| self.clock.now());
                let exec_time_ms = self.clock.now().saturating_sub(started) as f64;
                let index = self.ledger.with_chain_mut(|chain| {
                    let index = chain.tail_index_or_genesis(self.ledger.router());
                    chain.append_transaction(
                        index,
                        Transaction::completed(
                            tx_id.clone(),
                            index,
                            index,
                            payload.clone(),
                            TxKind::NonSharded,
                            exec_time_ms,
                        ),
                    )?;
                    self.status.complete(&tx_id, TxKind::NonSharded, &payload);
                    Ok::<_, LedgerError>(index)
                })?;
                info!(
                    "[ledger] {} reassembled into block {} ({} bytes)",
                    tx_id,
                    index,
                    payload.len()
                );
                self.emit_audit(&tx_id, index, index, TxKind::NonSharded, &payload, exec_time_ms)
                    .await;
                Ok(SegmentAck::Completed { transaction_id: tx_id })
            }
        }
    }
}

#[async_trait]
impl LedgerApi for LedgerService {
    async fn submit_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TxReceipt, LedgerError> {
        validate_request(&request)?;
        let transaction_id = self.enqueue(request)?;
        Ok(TxReceipt {
            transaction_id,
            status: TxStatus::Pending,
        })
    }

    async fn submit_segment(&self, segment: Segment) -> Result<SegmentAck, LedgerError> {
        self.core.accept_segment(segment).await
    }

    async fn submit_batch(
        &self,
        requests: Vec<TransactionRequest>,
    ) -> Result<Vec<TxId>, LedgerError> {
        if requests.is_empty() {
            return Err(LedgerError::InvalidInput("batch must not be empty".into()));
        }
        for request in &requests {
            validate_request(request)?;
        }

        let requested = requests.len();
        let core = &self.core;
        let now = core.clock.now();
        let ids = self
            .pipeline
            .enqueue_batch(requests, || {
                let tx_id = core.ids.next_id();
                core.status.insert_pending(&tx_id, TxOrigin::Pipeline, now);
                tx_id
            })
            .map_err(|e| match e {
                EnqueueError::Full => {
                    warn!("[ledger] queue cannot hold a batch of {}, rejecting", requested);
                    LedgerError::QueueFull {
                        capacity: self.pipeline.capacity(),
                        requested,
                    }
                }
                EnqueueError::Closed => LedgerError::InvalidInput("pipeline is shut down".into()),
            })?;
        info!("[ledger] batch of {} queued", ids.len());
        Ok(ids)
    }

    async fn submit_fan_out(&self, request: FanOutRequest) -> Result<Vec<TxId>, LedgerError> {
        if request.sources.is_empty() || request.targets.is_empty() {
            return Err(LedgerError::InvalidInput(
                "fan-out needs at least one source and one target".into(),
            ));
        }
        let payload = &request.payload;
        let targets = &request.targets;
        let requests = request
            .sources
            .iter()
            .flat_map(|source| {
                targets.iter().map(move |target| {
                    TransactionRequest::new(*source, *target, payload.clone()).sharded()
                })
            })
            .collect();
        self.submit_batch(requests).await
    }

    fn transaction_status(&self, tx_id: &str) -> Result<TxStatusView, LedgerError> {
        self.core.status.view(tx_id)
    }

    async fn await_terminal(
        &self,
        tx_id: &str,
        timeout: Duration,
    ) -> Result<TxStatusView, LedgerError> {
        self.core.status.await_terminal(tx_id, timeout).await
    }

    fn append_block(&self, originating_id: &str) -> Result<Block, LedgerError> {
        let core = &self.core;
        let shard_id = core.ledger.router().route(originating_id);
        let block = core.ledger.with_chain_mut(|chain| {
            if core.conflicts.check_and_log(chain, originating_id) {
                return Err(LedgerError::Conflict(originating_id.to_string()));
            }
            Ok(chain.append_block(originating_id, shard_id))
        })?;
        info!(
            "[ledger] block {} appended for {} on shard {}",
            block.index, originating_id, shard_id
        );
        Ok(block)
    }

    fn remove_last_block(&self) -> Result<Block, LedgerError> {
        let block = self.core.ledger.remove_last_block()?;
        info!("[ledger] block {} removed", block.index);
        Ok(block)
    }

    fn ledger(&self) -> Vec<Block> {
        self.core.ledger.blocks()
    }

    fn view_by_shard(&self, shard_id: i64) -> Result<Vec<Block>, LedgerError> {
        let ledger = &self.core.ledger;
        ledger.with_chain(|chain| view_by_shard(chain, ledger.router(), shard_id))
    }

    fn partition(&self) -> ShardPartition {
        let ledger = &self.core.ledger;
        ledger.with_chain(|chain| partition(chain, ledger.router().shard_count()))
    }

    fn conflicts(&self) -> ConflictLog {
        self.core.conflicts.log()
    }

    fn reassign_shard(
        &self,
        shard_id: i64,
        block_indices: &[BlockIndex],
    ) -> Result<usize, LedgerError> {
        let moved = self.core.ledger.reassign_shard(shard_id, block_indices)?;
        info!("[ledger] {} blocks reassigned to shard {}", moved, shard_id);
        Ok(moved)
    }

    fn reset_shards(&self) {
        let count = self.core.ledger.reset_shards();
        info!("[ledger] {} blocks reset to shard 0", count);
    }

    fn simulate_deadlock(
        &self,
        block_a: BlockIndex,
        block_b: BlockIndex,
    ) -> Result<DeadlockPair, LedgerError> {
        let core = &self.core;
        let tx1 = core.ids.next_id();
        let tx2 = core.ids.next_id();
        let now = core.clock.now();

        core.ledger.with_chain_mut(|chain| {
            core.conflicts
                .stage_deadlock(chain, block_a, block_b, (tx1.clone(), tx2.clone()))?;
            core.status.insert_pending(&tx1, TxOrigin::Staged, now);
            core.status.insert_pending(&tx2, TxOrigin::Staged, now);
            Ok::<_, LedgerError>(())
        })?;
        warn!(
            "[ledger] simulated deadlock between blocks {} and {} ({}, {})",
            block_a, block_b, tx1, tx2
        );
        Ok(DeadlockPair { tx1, tx2 })
    }

    async fn audit_logs(&self) -> Result<Vec<AuditRecord>, LedgerError> {
        self.core.audit.load_all().await
    }

    async fn throughput_report(&self) -> Result<ThroughputReport, LedgerError> {
        let records = self.core.audit.load_all().await?;
        Ok(ThroughputReport::from_records(&records))
    }

    fn verify_chain(&self) -> Result<(), ChainViolation> {
        self.core.ledger.with_chain(|chain| verify_chain(chain.blocks()))
    }

    async fn seed_from(&self, source: &dyn WorkloadSource) -> Result<SeedReport, LedgerError> {
        let workloads = source.list_workloads().await?;
        let mut report = SeedReport::default();
        for id in workloads {
            match self.append_block(&id) {
                Ok(block) => report.appended.push(block.index),
                Err(LedgerError::Conflict(id)) => report.conflicts.push(id),
                Err(e) => return Err(e),
            }
        }
        info!(
            "[ledger] seeded {} blocks ({} duplicates)",
            report.appended.len(),
            report.conflicts.len()
        );
        Ok(report)
    }
}
