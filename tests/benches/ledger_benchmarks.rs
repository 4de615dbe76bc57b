//! # Shard Ledger Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | hash-chain-compute | SHA-256 over the block's transaction JSON |
//! | hash-chain-verify | Full chain verification |
//! | hash-chain-relink | Insert into an early block, rehash successors |
//! | shard-router | Tenant, numeric and hashed routing |
//! | segmentation | Split and reverse-order reassembly |

use criterion::{criterion_group, criterion_main};
use ledger_tests::benchmarks::{hash_chain, routing};

criterion_group!(
    benches,
    hash_chain::bench_compute_hash,
    hash_chain::bench_verify_chain,
    hash_chain::bench_relink_on_insert,
    routing::bench_route,
    routing::bench_segmentation,
);
criterion_main!(benches);
