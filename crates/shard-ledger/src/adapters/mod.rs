//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports.

mod audit_log;
mod latency;
mod workload;

pub use audit_log::{rehydrate, InMemoryAuditLog, JsonLinesAuditLog};
pub use latency::{FixedLatency, RandomLatency};
pub use workload::StaticWorkloadSource;
