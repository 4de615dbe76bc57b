//! # Shard View
//!
//! Read-only partition of the ledger by shard id, rebuilt on every call.

use crate::algorithms::ShardRouter;
use crate::domain::{format_timestamp, invariant_shards_in_range, Block, BlockIndex, LedgerError, ShardId};
use crate::service::ledger::Chain;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Blocks of one shard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardSnapshot {
    /// Shard id.
    pub shard_id: ShardId,
    /// Blocks currently assigned to the shard, chain order.
    pub blocks: Vec<Block>,
}

/// Every shard at once.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardPartition {
    /// One entry per shard in `[0, shard_count)`.
    pub shards: Vec<ShardSnapshot>,
    /// Blocks whose shard id was out of range.
    pub skipped: Vec<BlockIndex>,
}

/// Blocks on `shard_id`.
pub fn view_by_shard(
    chain: &Chain,
    router: &ShardRouter,
    shard_id: i64,
) -> Result<Vec<Block>, LedgerError> {
    let shard_id = router.check_shard(shard_id)?;
    Ok(chain
        .blocks()
        .iter()
        .filter(|b| b.shard_id == shard_id)
        .cloned()
        .collect())
}

/// Partition the whole chain.
pub fn partition(chain: &Chain, shard_count: ShardId) -> ShardPartition {
    let mut shards: Vec<ShardSnapshot> = (0..shard_count)
        .map(|shard_id| ShardSnapshot {
            shard_id,
            blocks: Vec::new(),
        })
        .collect();
    let mut skipped = Vec::new();

    if invariant_shards_in_range(chain.blocks(), shard_count) {
        for block in chain.blocks() {
            shards[block.shard_id as usize].blocks.push(block.clone());
        }
        return ShardPartition { shards, skipped };
    }

    for block in chain.blocks() {
        match shards.get_mut(block.shard_id as usize) {
            Some(shard) => shard.blocks.push(block.clone()),
            None => {
                warn!(
                    "[ledger] block {} has out-of-range shard {}",
                    block.index, block.shard_id
                );
                skipped.push(block.index);
            }
        }
    }
    ShardPartition { shards, skipped }
}

impl fmt::Display for ShardPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for shard in &self.shards {
            writeln!(f, "Shard {} ({} blocks)", shard.shard_id, shard.blocks.len())?;
            for block in &shard.blocks {
                writeln!(
                    f,
                    "  #{:<4} {:<24} txs={:<3} v{:<4} {} {}",
                    block.index,
                    block.originating_id,
                    block.transactions.len(),
                    block.version,
                    format_timestamp(&block.timestamp),
                    &block.hash[..block.hash.len().min(12)]
                )?;
            }
        }
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped (out-of-range shard): {:?}", self.skipped)?;
        }
        Ok(())
    }
}
