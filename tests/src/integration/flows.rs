//! # Ledger Flows
//!
//! End-to-end behaviour through `LedgerApi` with deterministic latency:
//!
//! 1. Cross-shard transaction lands in its source block
//! 2. Caller-driven segments rebuild regardless of arrival order
//! 3. Duplicate originating ids never reach the chain
//! 4. Staged deadlock leaves exactly two pending transactions

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shard_ledger::algorithms::segment_payload;
    use shard_ledger::ports::{ManualTimeSource, MockAuditSink};
    use shard_ledger::{
        FixedLatency, LedgerApi, LedgerDependencies, LedgerError, LedgerService,
        LedgerServiceConfig, SegmentAck, TransactionRequest, TxKind, TxStatus,
    };

    const WAIT: Duration = Duration::from_secs(5);

    fn service_with(config: LedgerServiceConfig) -> (LedgerService, Arc<MockAuditSink>) {
        let audit = Arc::new(MockAuditSink::default());
        let deps = LedgerDependencies {
            audit: audit.clone(),
            latency: Arc::new(FixedLatency::zero()),
            clock: Arc::new(ManualTimeSource::new(0)),
        };
        (LedgerService::new(config, deps).unwrap(), audit)
    }

    fn service() -> (LedgerService, Arc<MockAuditSink>) {
        service_with(LedgerServiceConfig::for_testing())
    }

    fn seed(service: &LedgerService, count: usize) {
        for i in 0..count {
            service.append_block(&format!("node-{}", i)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_cross_shard_hello() {
        let (service, audit) = service();
        seed(&service, 3);
        assert_ne!(service.router().route("1"), service.router().route("2"));

        let receipt = service
            .submit_transaction(TransactionRequest::new(1, 2, "hello"))
            .await
            .unwrap();
        let view = service
            .await_terminal(&receipt.transaction_id, WAIT)
            .await
            .unwrap();

        assert_eq!(view.status, TxStatus::Completed);
        assert_eq!(view.kind, Some(TxKind::Sharded));
        let block = &service.ledger()[1];
        assert_eq!(block.transactions[0].payload, "hello");
        assert_eq!(block.version, 2);
        assert!(service.verify_chain().is_ok());

        for _ in 0..100 {
            if !audit.recorded().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let records = audit.recorded();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TxKind::Sharded);
        assert!(records[0].finality_ms >= records[0].exec_time_ms);
    }

    #[tokio::test]
    async fn test_twelve_bytes_in_three_segments() {
        let mut config = LedgerServiceConfig::for_testing();
        config.ledger.segment_size = 5;
        let (service, _) = service_with(config);
        seed(&service, 2);

        let mut segments = segment_payload("tx-seg", 0, "abcdefghijkl", 5);
        assert_eq!(
            segments.iter().map(|s| s.chunk.len()).collect::<Vec<_>>(),
            vec![5, 5, 2]
        );
        segments.reverse();

        let last = segments.pop().unwrap();
        for segment in segments {
            let ack = service.submit_segment(segment).await.unwrap();
            assert!(matches!(ack, SegmentAck::Received { .. }));
            assert_ne!(
                service.transaction_status("tx-seg").unwrap().status,
                TxStatus::Completed
            );
        }
        let ack = service.submit_segment(last).await.unwrap();
        assert!(matches!(ack, SegmentAck::Completed { .. }));

        let view = service.transaction_status("tx-seg").unwrap();
        assert_eq!(view.status, TxStatus::Completed);
        assert_eq!(view.payload.as_deref(), Some("abcdefghijkl"));
        assert!(service.verify_chain().is_ok());
    }

    #[tokio::test]
    async fn test_long_payload_rebuilt_by_pipeline() {
        let (service, _) = service();
        seed(&service, 4);
        let payload = "0123456789".repeat(7);

        let receipt = service
            .submit_transaction(TransactionRequest::new(2, 3, payload.clone()))
            .await
            .unwrap();
        let view = service
            .await_terminal(&receipt.transaction_id, WAIT)
            .await
            .unwrap();

        assert_eq!(view.status, TxStatus::Completed);
        assert_eq!(view.payload.as_deref(), Some(payload.as_str()));
        assert_eq!(service.pending_segment_buffers(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_origin_rejected() {
        let (service, _) = service();
        service.append_block("org1-5").unwrap();
        let err = service.append_block("org1-5").unwrap_err();

        assert!(matches!(err, LedgerError::Conflict(ref id) if id == "org1-5"));
        assert_eq!(service.ledger().len(), 1);
        let log = service.conflicts();
        assert_eq!(log.total, 1);
        assert_eq!(
            log.entries[0].message,
            "Concurrency conflict detected for identifier: org1-5"
        );
    }

    #[tokio::test]
    async fn test_remove_until_empty() {
        let (service, _) = service();
        seed(&service, 2);
        assert_eq!(service.remove_last_block().unwrap().index, 1);
        assert_eq!(service.remove_last_block().unwrap().index, 0);
        assert!(matches!(
            service.remove_last_block(),
            Err(LedgerError::EmptyLedger)
        ));
    }

    #[tokio::test]
    async fn test_deadlock_pair_never_settles() {
        let (service, _) = service();
        seed(&service, 3);
        let before: usize = service
            .ledger()
            .iter()
            .map(|b| b.transactions.len())
            .sum();

        let pair = service.simulate_deadlock(0, 2).unwrap();
        let view = service
            .await_terminal(&pair.tx1, Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(view.status, TxStatus::Pending);
        assert_eq!(
            service.transaction_status(&pair.tx2).unwrap().status,
            TxStatus::Pending
        );

        let after: usize = service
            .ledger()
            .iter()
            .map(|b| b.transactions.len())
            .sum();
        assert_eq!(after, before + 2);
        assert!(service.verify_chain().is_ok());
    }

    #[tokio::test]
    async fn test_missing_source_fails_after_retries() {
        let (service, audit) = service();
        seed(&service, 2);
        let before = service.ledger();

        let receipt = service
            .submit_transaction(TransactionRequest::new(9, 1, "lost"))
            .await
            .unwrap();
        let view = service
            .await_terminal(&receipt.transaction_id, WAIT)
            .await
            .unwrap();

        assert_eq!(view.status, TxStatus::Failed);
        assert_eq!(service.ledger(), before);
        assert!(audit.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_reassign_then_reset() {
        let (service, _) = service();
        seed(&service, 4);

        assert_eq!(service.reassign_shard(1, &[0, 2]).unwrap(), 2);
        let shard_one = service.view_by_shard(1).unwrap();
        assert!(shard_one.iter().any(|b| b.index == 0));
        assert!(service.view_by_shard(7).is_err());

        service.reset_shards();
        assert!(service.ledger().iter().all(|b| b.shard_id == 0));
        assert_eq!(service.partition().shards[0].blocks.len(), 4);
    }
}
