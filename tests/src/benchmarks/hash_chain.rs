//! # Hash Chain Benchmarks
//!
//! - Block hash over growing transaction sets
//! - Full chain verification over growing chains
//! - Mid-chain insert, which rehashes and relinks every successor

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use shard_ledger::service::Ledger;
use shard_ledger::{compute_hash, verify_chain, ShardRouter, Transaction, TxKind};

fn transactions(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            Transaction::completed(
                format!("tx-{}", i),
                1,
                7,
                "x".repeat(50),
                TxKind::Sharded,
                1500.0,
            )
        })
        .collect()
}

fn ledger_with(blocks: usize) -> Ledger {
    let ledger = Ledger::new(ShardRouter::default());
    for i in 0..blocks {
        ledger.append_block(&format!("bench-{}", i));
    }
    ledger
}

/// Hash one block carrying 0..1000 transactions.
pub fn bench_compute_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash-chain-compute");
    let timestamp = chrono::Utc::now();

    for size in [0usize, 10, 100, 1000] {
        let txs = transactions(size);
        group.throughput(Throughput::Elements(size.max(1) as u64));
        group.bench_with_input(BenchmarkId::new("transactions", size), &txs, |b, txs| {
            b.iter(|| black_box(compute_hash(42, &timestamp, txs, "0")))
        });
    }
    group.finish();
}

/// Verify chains of 10..10 000 blocks.
pub fn bench_verify_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash-chain-verify");

    for size in [10usize, 1_000, 10_000] {
        let blocks = ledger_with(size).blocks();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("blocks", size), &blocks, |b, blocks| {
            b.iter(|| black_box(verify_chain(blocks).is_ok()))
        });
    }
    group.finish();
}

/// Insert into block 0 of an N-block chain.
pub fn bench_relink_on_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash-chain-relink");

    for size in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("successors", size), &size, |b, &size| {
            let ledger = ledger_with(size);
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                let tx = Transaction::completed(
                    format!("tx-{}", n),
                    0,
                    1,
                    "payload".into(),
                    TxKind::NonSharded,
                    0.0,
                );
                black_box(ledger.append_transaction(0, tx).is_ok())
            })
        });
    }
    group.finish();
}
