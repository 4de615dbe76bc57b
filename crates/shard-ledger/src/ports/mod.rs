//! # Ports Module
//!
//! Hexagonal boundaries of the ledger.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
