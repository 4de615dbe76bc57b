//! # Domain Invariants
//!
//! Rules that must hold whenever the ledger lock is not held.

use super::entities::{Block, GENESIS_PREVIOUS_HASH, GENESIS_VERSION};
use super::errors::ShardId;

/// Minimum shard count.
pub const MIN_SHARD_COUNT: ShardId = 1;

/// Invariant: every block links to its predecessor's hash; block 0 links
/// to the genesis sentinel.
///
/// Returns the index of the first broken link.
pub fn invariant_chain_linked(blocks: &[Block]) -> Result<(), usize> {
    for (pos, block) in blocks.iter().enumerate() {
        let expected = match pos {
            0 => GENESIS_PREVIOUS_HASH,
            _ => blocks[pos - 1].hash.as_str(),
        };
        if block.previous_hash != expected {
            return Err(pos);
        }
    }
    Ok(())
}

/// Invariant: block 0 has version 1 and each block is exactly one above
/// its predecessor. Indices equal positions.
pub fn invariant_versions_monotonic(blocks: &[Block]) -> Result<(), usize> {
    for (pos, block) in blocks.iter().enumerate() {
        if block.index != pos as u64 || block.version != GENESIS_VERSION + pos as u64 {
            return Err(pos);
        }
    }
    Ok(())
}

/// Invariant: shard ids lie in `[0, shard_count)`.
pub fn invariant_shards_in_range(blocks: &[Block], shard_count: ShardId) -> bool {
    blocks.iter().all(|b| b.shard_id < shard_count)
}

/// Invariant: segment indices for one transaction form `0..total` with no
/// duplicates.
pub fn invariant_segments_contiguous(indices: &[u32], total: u32) -> bool {
    if indices.len() != total as usize {
        return false;
    }
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(pos, idx)| *idx == pos as u32)
}

/// Invariant: routing is deterministic for a fixed shard count.
pub fn invariant_deterministic_routing<F>(route: F, identifier: &str) -> bool
where
    F: Fn(&str) -> ShardId,
{
    route(identifier) == route(identifier)
}
