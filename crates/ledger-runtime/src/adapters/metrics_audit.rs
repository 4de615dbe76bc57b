//! Audit sink wrapper that feeds Prometheus.

use std::sync::Arc;

use async_trait::async_trait;
use ledger_telemetry::{
    log_tx_event, metric_inc, metric_observe, AUDIT_WRITE_FAILURES, EXEC_TIME, FINALITY, TRANSACTIONS_COMPLETED,
};
use shard_ledger::ports::AuditSink;
use shard_ledger::{AuditRecord, LedgerError};

/// Records exec/finality histograms and completions per kind, then
/// forwards to the wrapped sink.
pub struct MetricsAuditSink {
    inner: Arc<dyn AuditSink>,
}

impl MetricsAuditSink {
    /// Wrap a sink.
    pub fn new(inner: Arc<dyn AuditSink>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AuditSink for MetricsAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), LedgerError> {
        let kind = record.kind.as_str();
        metric_inc!(TRANSACTIONS_COMPLETED, &[kind]);
        metric_observe!(EXEC_TIME, &[kind], record.exec_time_ms / 1000.0);
        metric_observe!(FINALITY, &[kind], record.finality_ms / 1000.0);

        let result = self.inner.record(record).await;
        if let Err(e) = &result {
            metric_inc!(AUDIT_WRITE_FAILURES);
            log_tx_event!(warn, "audit", "audit write failed", record.tx_id, error = %e);
        }
        result
    }

    async fn load_all(&self) -> Result<Vec<AuditRecord>, LedgerError> {
        self.inner.load_all().await
    }
}
