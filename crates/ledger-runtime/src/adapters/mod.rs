//! # Runtime Adapters
//!
//! Decorators around the ledger's outbound ports.

mod metrics_audit;

pub use metrics_audit::MetricsAuditSink;
