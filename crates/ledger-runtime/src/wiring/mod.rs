//! # Background Wiring
//!
//! Long-running tasks spawned next to the ledger service. Each task stops
//! when the shared shutdown signal flips to `true`.

mod maintenance;

pub use maintenance::{spawn_maintenance, MetricsSnapshot};
