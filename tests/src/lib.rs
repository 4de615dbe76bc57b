//! # Shard Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion bench bodies (hashing, routing, segments)
//! └── integration/      # Cross-crate flows through LedgerApi and the runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::
//! cargo bench -p ledger-tests
//! ```

#![allow(dead_code)]

pub mod benchmarks;
pub mod integration;
