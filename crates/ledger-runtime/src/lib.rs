//! # Ledger Runtime Library
//!
//! Exposes the runtime's modules for testing. The entry point is the
//! `main.rs` binary.
//!
//! ## Modules
//!
//! - `container/` - Configuration and service wiring
//! - `adapters/` - Metrics decorator for the audit sink
//! - `scenarios/` - Sharded, non-sharded and stress load drivers
//! - `wiring/` - Segment GC and metrics monitor
//! - `display` - Chain and conflict rendering

#![warn(missing_docs)]

pub mod adapters;
pub mod container;
pub mod display;
pub mod runtime;
pub mod scenarios;
pub mod wiring;

pub use container::{ConfigError, LedgerContainer, RuntimeConfig, ScenarioConfig, ScenarioKind};
pub use runtime::LedgerRuntime;
pub use scenarios::{ensure_blocks, ScenarioReport, ScenarioRunner, WorkloadGenerator};
