//! # Algorithms Module
//!
//! Pure algorithms: hashing, routing, segmentation and the cost model.

pub mod cost_model;
pub mod hash_chain;
pub mod segmentation;
pub mod shard_router;

pub use cost_model::{KindSummary, NetworkCost, SyntheticMetrics, ThroughputReport};
pub use hash_chain::{block_hash, compute_hash, verify, verify_chain, ChainViolation};
pub use segmentation::{reassemble, segment_payload, split_payload};
pub use shard_router::ShardRouter;
