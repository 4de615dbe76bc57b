//! Segment GC and metrics refresh on fixed intervals.

use std::sync::Arc;
use std::time::Duration;

use ledger_telemetry::{
    CHAIN_HEIGHT, CONFLICTS_DETECTED, QUEUE_DEPTH, SEGMENT_BUFFERS_EXPIRED,
    SEGMENT_BUFFERS_PENDING, TRANSACTIONS_FAILED, TRANSACTIONS_IN_FLIGHT,
};
use shard_ledger::{LedgerApi, LedgerService, TxStatus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Point-in-time service counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Blocks in the chain.
    pub chain_height: usize,
    /// Jobs waiting in the pipeline queue.
    pub queued: usize,
    /// Pending plus in-progress transactions.
    pub in_flight: usize,
    /// Failed transactions.
    pub failed: usize,
    /// Conflicts since start.
    pub conflicts: u64,
    /// Open segment buffers.
    pub segment_buffers: usize,
}

impl MetricsSnapshot {
    /// Read the current counters.
    pub fn capture(service: &LedgerService) -> Self {
        let counts = service.status_counts();
        let count = |s: TxStatus| counts.get(&s).copied().unwrap_or(0);
        Self {
            chain_height: service.ledger().len(),
            queued: service.pipeline().queued(),
            in_flight: count(TxStatus::Pending) + count(TxStatus::InProgress),
            failed: count(TxStatus::Failed),
            conflicts: service.conflicts().total,
            segment_buffers: service.pending_segment_buffers(),
        }
    }

    /// Push gauges and counter deltas since `previous`.
    pub fn publish(&self, previous: &MetricsSnapshot) {
        CHAIN_HEIGHT.set(self.chain_height as f64);
        QUEUE_DEPTH.set(self.queued as f64);
        TRANSACTIONS_IN_FLIGHT.set(self.in_flight as f64);
        SEGMENT_BUFFERS_PENDING.set(self.segment_buffers as f64);
        TRANSACTIONS_FAILED.inc_by(self.failed.saturating_sub(previous.failed) as f64);
        CONFLICTS_DETECTED.inc_by(self.conflicts.saturating_sub(previous.conflicts) as f64);
    }
}

/// Spawn the maintenance loop.
///
/// Every `gc_interval` expired segment buffers are purged; every
/// `monitor_interval` the Prometheus gauges are refreshed.
pub fn spawn_maintenance(
    service: Arc<LedgerService>,
    monitor_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let gc_interval = service.config().pipeline.gc_interval();
    tokio::spawn(async move {
        let mut gc = tokio::time::interval(gc_interval);
        let mut monitor = tokio::time::interval(monitor_interval);
        let mut last = MetricsSnapshot::default();

        loop {
            tokio::select! {
                _ = gc.tick() => {
                    let purged = service.gc_segments();
                    if !purged.is_empty() {
                        SEGMENT_BUFFERS_EXPIRED.inc_by(purged.len() as f64);
                        info!("[runtime] gc purged {} segment buffers", purged.len());
                    }
                    let dropped = service.gc_statuses();
                    if dropped > 0 {
                        debug!("[runtime] gc dropped {} terminal statuses", dropped);
                    }
                }
                _ = monitor.tick() => {
                    let snapshot = MetricsSnapshot::capture(&service);
                    snapshot.publish(&last);
                    debug!("[runtime] {:?}", snapshot);
                    last = snapshot;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        MetricsSnapshot::capture(&service).publish(&last);
        info!("[runtime] maintenance stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{LedgerContainer, RuntimeConfig};

    #[tokio::test]
    async fn test_snapshot_reads_service() {
        let container = LedgerContainer::new(RuntimeConfig::for_testing()).unwrap();
        container.service.append_block("org1-a").unwrap();
        let _ = container.service.append_block("org1-a");

        let snapshot = MetricsSnapshot::capture(&container.service);
        assert_eq!(snapshot.chain_height, 1);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.queued, 0);
    }

    #[tokio::test]
    async fn test_queue_depth_tracks_queue_not_in_flight() {
        let container = LedgerContainer::new(RuntimeConfig::for_testing()).unwrap();
        for i in 0..3 {
            container.service.append_block(&format!("org1-{}", i)).unwrap();
        }
        let pair = container.service.simulate_deadlock(0, 1).unwrap();
        assert!(!pair.tx1.is_empty());

        let snapshot = MetricsSnapshot::capture(&container.service);
        assert_eq!(snapshot.in_flight, 2);
        assert_eq!(snapshot.queued, 0);
    }

    #[tokio::test]
    async fn test_maintenance_stops_on_signal() {
        let container = LedgerContainer::new(RuntimeConfig::for_testing()).unwrap();
        let (tx, rx) = watch::channel(false);
        let handle = spawn_maintenance(container.service.clone(), Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
