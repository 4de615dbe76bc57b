//! # Ledger Benchmarks
//!
//! Criterion bodies, registered from `benches/ledger_benchmarks.rs`.

pub mod hash_chain;
pub mod routing;
