//! # Audit Trail Tests
//!
//! Persistence and rehydration of audit records through the JSON-lines
//! adapter, including documents written by older deployments.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use shard_ledger::ports::{AuditSink, ManualTimeSource};
    use shard_ledger::{
        FixedLatency, JsonLinesAuditLog, LedgerApi, LedgerDependencies, LedgerService,
        LedgerServiceConfig, TransactionRequest, TxKind,
    };

    fn service(audit: Arc<JsonLinesAuditLog>) -> LedgerService {
        let deps = LedgerDependencies {
            audit,
            latency: Arc::new(FixedLatency::zero()),
            clock: Arc::new(ManualTimeSource::new(0)),
        };
        LedgerService::new(LedgerServiceConfig::for_testing(), deps).unwrap()
    }

    async fn wait_for_records(service: &LedgerService, expected: usize) {
        for _ in 0..100 {
            if service.audit_logs().await.unwrap().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("audit trail never reached {} records", expected);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let first = service(Arc::new(JsonLinesAuditLog::new(&path)));
        for i in 0..3 {
            first.append_block(&format!("b{}", i)).unwrap();
        }
        let ids = first
            .submit_batch(vec![
                TransactionRequest::new(1, 2, "cross"),
                TransactionRequest::new(0, 2, "same"),
            ])
            .await
            .unwrap();
        for id in &ids {
            first.await_terminal(id, Duration::from_secs(5)).await.unwrap();
        }
        wait_for_records(&first, 2).await;

        let reopened = JsonLinesAuditLog::new(&path);
        let records = reopened.load_all().await.unwrap();
        assert_eq!(records.len(), 2);

        let second = service(Arc::new(reopened));
        let report = second.throughput_report().await.unwrap();
        assert_eq!(report.summary(TxKind::Sharded).map(|s| s.count), Some(1));
        assert_eq!(report.summary(TxKind::NonSharded).map(|s| s.count), Some(1));
    }

    #[tokio::test]
    async fn test_legacy_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let legacy = json!({
            "txID": "tx-legacy",
            "source": 1,
            "target": 7,
            "message": "old",
            "type": "Sharded",
            "execTime": 1500.0,
            "finality": 1620.0,
            "propagationLatency": 40.0,
            "tps": 0.617,
            "timestamp": "2024-03-01T10:00:00Z"
        });
        let unknown_version = json!({ "schema_version": 9, "tx_id": "tx-future" });
        let mistyped = json!({ "txID": 42, "source": "one" });
        let contents = format!(
            "{}\nnot json at all\n{}\n\n{}\n",
            legacy, unknown_version, mistyped
        );
        tokio::fs::write(&path, contents).await.unwrap();

        let records = JsonLinesAuditLog::new(&path).load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tx_id, "tx-legacy");
        assert_eq!(records[0].kind, TxKind::Sharded);
        assert_eq!(records[0].finality_ms, 1620.0);
    }
}
