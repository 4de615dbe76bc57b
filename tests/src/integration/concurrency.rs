//! # Concurrency Tests
//!
//! Hazards the ledger must survive under a multi-threaded runtime:
//! - Racing appends of the same originating id
//! - Interleaved transaction finalization into shared blocks
//! - Racing first segments of one transaction

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shard_ledger::algorithms::segment_payload;
    use shard_ledger::ports::{ManualTimeSource, MockAuditSink};
    use shard_ledger::{
        FixedLatency, LedgerApi, LedgerDependencies, LedgerError, LedgerService,
        LedgerServiceConfig, SegmentAck, TransactionRequest, TxStatus,
    };
    use tokio::task::JoinSet;

    fn shared_service(delay: Duration) -> Arc<LedgerService> {
        let deps = LedgerDependencies {
            audit: Arc::new(MockAuditSink::default()),
            latency: Arc::new(FixedLatency::with_delay(delay)),
            clock: Arc::new(ManualTimeSource::new(0)),
        };
        Arc::new(LedgerService::new(LedgerServiceConfig::for_testing(), deps).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_appends_admit_one() {
        let service = shared_service(Duration::ZERO);
        let mut tasks = JoinSet::new();
        for _ in 0..32 {
            let service = Arc::clone(&service);
            tasks.spawn(async move { service.append_block("org2-shared") });
        }

        let mut ok = 0;
        let mut conflicts = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => ok += 1,
                Err(LedgerError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(conflicts, 31);
        assert_eq!(service.ledger().len(), 1);
        assert_eq!(service.conflicts().total, 31);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_finalization_keeps_chain_valid() {
        let service = shared_service(Duration::from_millis(2));
        for i in 0..6 {
            service.append_block(&format!("block-{}", i)).unwrap();
        }

        let mut requests = Vec::new();
        for source in 0..6u64 {
            for target in 0..6u64 {
                requests.push(TransactionRequest::new(source, target, format!("{}>{}", source, target)));
            }
        }
        let ids = service.submit_batch(requests).await.unwrap();
        assert_eq!(ids.len(), 36);

        for id in &ids {
            let view = service
                .await_terminal(id, Duration::from_secs(10))
                .await
                .unwrap();
            assert_eq!(view.status, TxStatus::Completed);
        }

        let blocks = service.ledger();
        let total: usize = blocks.iter().map(|b| b.transactions.len()).sum();
        assert_eq!(total, 36);
        assert!(blocks.iter().all(|b| b.transactions.len() == 6));
        assert!(service.verify_chain().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_segments_complete_once() {
        let service = shared_service(Duration::ZERO);
        service.append_block("tail").unwrap();

        let segments = segment_payload("tx-race", 0, "the quick brown fox jumps", 4);
        let total = segments.len();
        let mut tasks = JoinSet::new();
        for segment in segments {
            let service = Arc::clone(&service);
            tasks.spawn(async move { service.submit_segment(segment).await });
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            if let SegmentAck::Completed { .. } = joined.unwrap().unwrap() {
                completed += 1;
            }
        }

        assert!(total > 1);
        assert_eq!(completed, 1);
        let view = service.transaction_status("tx-race").unwrap();
        assert_eq!(view.payload.as_deref(), Some("the quick brown fox jumps"));
        assert_eq!(service.ledger()[0].transactions.len(), 1);
    }
}
