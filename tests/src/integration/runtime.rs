//! # Runtime Tests
//!
//! The runtime crate driving the ledger end to end with fast latencies.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ledger_runtime::{LedgerRuntime, RuntimeConfig, ScenarioKind};
    use shard_ledger::{LedgerApi, TxKind};

    #[tokio::test]
    async fn test_all_scenarios_from_env_style_config() {
        let config = RuntimeConfig::from_lookup(|key| match key {
            "SL_FAST_LATENCY" => Some("1".into()),
            "SL_TRANSACTIONS" => Some("6".into()),
            "SL_SCENARIO_WORKERS" => Some("3".into()),
            "SL_PAYLOAD_LEN" => Some("24".into()),
            "SL_SEED_WORKLOADS" => Some("org1-web,org2-db".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.scenarios.run, ScenarioKind::all());

        let runtime = LedgerRuntime::new(config).unwrap();
        runtime.start().await.unwrap();
        let reports = runtime.run_scenarios().await.unwrap();

        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert_eq!(report.submitted, 6);
            assert_eq!(report.unsettled, 0);
        }

        let service = runtime.service();
        assert_eq!(service.ledger()[0].originating_id, "org1-web");
        assert!(service.ledger().len() >= 11);
        assert!(service.verify_chain().is_ok());

        let completed: usize = reports.iter().map(|r| r.completed).sum();
        let mut audited = 0;
        for _ in 0..100 {
            let throughput = service.throughput_report().await.unwrap();
            audited = [TxKind::Sharded, TxKind::NonSharded]
                .iter()
                .filter_map(|kind| throughput.summary(*kind))
                .map(|s| s.count)
                .sum::<usize>();
            if audited == completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(audited, completed);

        let summary = runtime.summary(&reports).await.unwrap();
        assert!(summary.contains("== Scenarios =="));
        assert!(summary.contains("stress"));
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_runtime_feeds_prometheus_registry() {
        ledger_telemetry::register_metrics().unwrap();
        let mut config = RuntimeConfig::for_testing();
        config.scenarios.run = vec![ScenarioKind::Sharded];

        let runtime = LedgerRuntime::new(config).unwrap();
        runtime.start().await.unwrap();
        runtime.run_scenarios().await.unwrap();
        runtime.shutdown().await;

        assert!(ledger_telemetry::BLOCKS_APPENDED.get() >= 11.0);
        assert!(ledger_telemetry::TRANSACTIONS_SUBMITTED.get() >= 4.0);
        let text = ledger_telemetry::encode_metrics().unwrap();
        assert!(text.contains("sl_chain_blocks_appended_total"));
    }
}
