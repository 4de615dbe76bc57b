//! # Integration Tests
//!
//! Cross-crate flows through the public `LedgerApi`, the audit adapters and
//! the runtime.

pub mod audit_trail;
pub mod concurrency;
pub mod flows;
pub mod runtime;
