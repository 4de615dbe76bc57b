//! # Routing and Segmentation Benchmarks

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use shard_ledger::algorithms::{reassemble, segment_payload};
use shard_ledger::{ShardRouter, TenantRule};

/// Route tenant, numeric and hashed identifiers.
pub fn bench_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("shard-router");
    let router = ShardRouter::new(
        16,
        vec![TenantRule::new("org1", 0), TenantRule::new("org2", 1)],
    )
    .unwrap_or_default();

    let inputs = [
        ("tenant", "org1-payments"),
        ("numeric", "123456"),
        ("hashed", "3f9a2c1d7e6b"),
    ];
    for (label, id) in inputs {
        group.bench_with_input(BenchmarkId::new("route", label), &id, |b, id| {
            b.iter(|| black_box(router.route(id)))
        });
    }

    group.bench_function("classify", |b| {
        b.iter(|| black_box(router.classify(black_box(3), black_box(8))))
    });
    group.finish();
}

/// Split and rebuild payloads of growing size in reverse order.
pub fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    for len in [50usize, 1_000, 100_000] {
        let payload = "a".repeat(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("round_trip", len), &payload, |b, payload| {
            b.iter(|| {
                let mut segments = segment_payload("tx-bench", 0, payload, 10);
                segments.reverse();
                black_box(reassemble(&segments).map(|p| p.len()))
            })
        });
    }
    group.finish();
}
