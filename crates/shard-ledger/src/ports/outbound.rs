//! # Outbound Ports
//!
//! Traits for the collaborators the ledger depends on: the audit document
//! store, the workload inventory, the latency model and the clock.

use crate::algorithms::NetworkCost;
use crate::domain::{AuditRecord, LedgerError, TxKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Append-only audit trail - outbound port.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record.
    async fn record(&self, record: &AuditRecord) -> Result<(), LedgerError>;

    /// Load every stored record; malformed documents are skipped.
    async fn load_all(&self) -> Result<Vec<AuditRecord>, LedgerError>;
}

/// Live workload inventory - outbound port.
///
/// The container runtime inspector in production; a static list here.
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// Identifiers of currently live workloads.
    async fn list_workloads(&self) -> Result<Vec<String>, LedgerError>;
}

/// Simulated latency - outbound port.
pub trait LatencyModel: Send + Sync {
    /// Processing delay before finalize.
    fn processing_delay(&self, kind: TxKind) -> Duration;

    /// Consensus and propagation estimate for the audit record.
    fn network_cost(&self, kind: TxKind) -> NetworkCost;
}

/// Time source - outbound port.
pub trait TimeSource: Send + Sync {
    /// Current time in milliseconds since epoch.
    fn now(&self) -> u64;
}

/// System clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    /// Start at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Audit sink that keeps records in memory and can be told to fail.
#[derive(Default)]
pub struct MockAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    fail: AtomicBool,
}

impl MockAuditSink {
    /// Make every subsequent `record` call fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Records written so far.
    pub fn recorded(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), LedgerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LedgerError::Audit("mock sink unavailable".into()));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AuditRecord>, LedgerError> {
        Ok(self.recorded())
    }
}

/// Workload source returning a fixed list or an error.
#[derive(Clone, Default)]
pub struct MockWorkloadSource {
    /// Ids returned by `list_workloads`.
    pub workloads: Vec<String>,
    /// Return an error instead.
    pub unavailable: bool,
}

#[async_trait]
impl WorkloadSource for MockWorkloadSource {
    async fn list_workloads(&self) -> Result<Vec<String>, LedgerError> {
        if self.unavailable {
            return Err(LedgerError::NotFound("workload inventory unavailable".into()));
        }
        Ok(self.workloads.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AUDIT_SCHEMA_VERSION;
    use chrono::Utc;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualTimeSource::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now(), 3_000);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemTimeSource.now() > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn test_mock_sink_failure_toggle() {
        let sink = MockAuditSink::default();
        let record = AuditRecord {
            schema_version: AUDIT_SCHEMA_VERSION,
            tx_id: "tx-1".into(),
            source: 0,
            target: 1,
            kind: TxKind::Sharded,
            message: "m".into(),
            exec_time_ms: 1.0,
            finality_ms: 2.0,
            propagation_ms: 0.5,
            tps: 500.0,
            timestamp: Utc::now(),
        };
        sink.record(&record).await.unwrap();
        sink.fail_writes(true);
        assert!(sink.record(&record).await.is_err());
        assert_eq!(sink.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_workload_source() {
        let source = MockWorkloadSource {
            workloads: vec!["org1-a".into()],
            unavailable: false,
        };
        assert_eq!(source.list_workloads().await.unwrap().len(), 1);
        let down = MockWorkloadSource {
            unavailable: true,
            ..Default::default()
        };
        assert!(down.list_workloads().await.is_err());
    }
}
