//! # Ledger
//!
//! The ordered block sequence behind a single writer lock.
//!
//! All access goes through [`Ledger::with_chain`] / [`Ledger::with_chain_mut`];
//! the guard is dropped on every exit path of the closure. Any mutation that
//! changes a block's contents rehashes it and relinks its successors, so the
//! chain is consistent whenever the lock is free.

use crate::algorithms::{block_hash, compute_hash, ShardRouter};
use crate::domain::{
    Block, BlockIndex, LedgerError, ShardId, Transaction, GENESIS_ORIGIN, GENESIS_PREVIOUS_HASH,
    GENESIS_VERSION,
};
use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

/// Block storage. Only reachable through the [`Ledger`] lock.
#[derive(Debug, Default)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the chain has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `index`.
    pub fn get(&self, index: BlockIndex) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Whether `identifier` is a block origin or transaction id.
    pub fn find_identifier(&self, identifier: &str) -> bool {
        self.blocks.iter().any(|b| b.carries_identifier(identifier))
    }

    /// Append an empty block for `originating_id` on `shard_id`.
    pub fn append_block(&mut self, originating_id: &str, shard_id: ShardId) -> Block {
        let (previous_hash, version) = match self.blocks.last() {
            Some(tail) => (tail.hash.clone(), tail.version + 1),
            None => (GENESIS_PREVIOUS_HASH.to_string(), GENESIS_VERSION),
        };
        let index = self.blocks.len() as BlockIndex;
        let timestamp = Utc::now();
        let hash = compute_hash(index, &timestamp, &[], &previous_hash);

        let block = Block {
            index,
            timestamp,
            originating_id: originating_id.to_string(),
            transactions: Vec::new(),
            previous_hash,
            hash,
            version,
            shard_id,
        };
        self.blocks.push(block.clone());
        block
    }

    /// Add a transaction to block `index`, rehash and relink successors.
    pub fn append_transaction(
        &mut self,
        index: BlockIndex,
        tx: Transaction,
    ) -> Result<(), LedgerError> {
        let pos = usize::try_from(index)
            .ok()
            .filter(|p| *p < self.blocks.len())
            .ok_or_else(|| LedgerError::block_not_found(index))?;

        let block = &mut self.blocks[pos];
        block.transactions.push(tx);
        block.hash = block_hash(block);
        self.relink_from(pos + 1);
        Ok(())
    }

    /// Remove the tail block.
    pub fn remove_last_block(&mut self) -> Result<Block, LedgerError> {
        self.blocks.pop().ok_or(LedgerError::EmptyLedger)
    }

    /// Move the given blocks to `shard_id`; unknown indices are ignored.
    pub fn reassign(&mut self, shard_id: ShardId, indices: &[BlockIndex]) -> usize {
        let mut moved = 0;
        for index in indices {
            if let Some(block) = usize::try_from(*index)
                .ok()
                .and_then(|i| self.blocks.get_mut(i))
            {
                block.shard_id = shard_id;
                moved += 1;
            }
        }
        moved
    }

    /// Put every block on shard 0.
    pub fn reset_shards(&mut self) -> usize {
        for block in &mut self.blocks {
            block.shard_id = 0;
        }
        self.blocks.len()
    }

    /// Index of the tail block, creating a genesis block if empty.
    pub fn tail_index_or_genesis(&mut self, router: &ShardRouter) -> BlockIndex {
        match self.blocks.last() {
            Some(tail) => tail.index,
            None => {
                debug!("[ledger] empty chain, creating genesis block");
                self.append_block(GENESIS_ORIGIN, router.route(GENESIS_ORIGIN))
                    .index
            }
        }
    }

    fn relink_from(&mut self, start: usize) {
        for pos in start.max(1)..self.blocks.len() {
            let prev = self.blocks[pos - 1].hash.clone();
            let block = &mut self.blocks[pos];
            block.previous_hash = prev;
            block.hash = block_hash(block);
        }
    }
}

/// Exclusive owner of block storage.
#[derive(Debug)]
pub struct Ledger {
    chain: Mutex<Chain>,
    router: ShardRouter,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(router: ShardRouter) -> Self {
        Self {
            chain: Mutex::new(Chain::default()),
            router,
        }
    }

    /// Router used for block placement.
    pub fn router(&self) -> &ShardRouter {
        &self.router
    }

    /// Run `f` with shared access to the chain.
    pub fn with_chain<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        let guard = self.chain.lock();
        f(&guard)
    }

    /// Run `f` with exclusive access to the chain.
    pub fn with_chain_mut<R>(&self, f: impl FnOnce(&mut Chain) -> R) -> R {
        let mut guard = self.chain.lock();
        f(&mut guard)
    }

    /// Append an empty block routed by its originating id.
    pub fn append_block(&self, originating_id: &str) -> Block {
        let shard_id = self.router.route(originating_id);
        let block = self.with_chain_mut(|chain| chain.append_block(originating_id, shard_id));
        debug!(
            "[ledger] appended block {} for {} on shard {}",
            block.index, originating_id, shard_id
        );
        block
    }

    /// Append a transaction to block `index`.
    pub fn append_transaction(&self, index: BlockIndex, tx: Transaction) -> Result<(), LedgerError> {
        self.with_chain_mut(|chain| chain.append_transaction(index, tx))
    }

    /// Remove the tail block.
    pub fn remove_last_block(&self) -> Result<Block, LedgerError> {
        self.with_chain_mut(Chain::remove_last_block)
    }

    /// Linear scan for an identifier.
    pub fn find_identifier(&self, identifier: &str) -> bool {
        self.with_chain(|chain| chain.find_identifier(identifier))
    }

    /// Block snapshot.
    pub fn get_block(&self, index: BlockIndex) -> Option<Block> {
        self.with_chain(|chain| chain.get(index).cloned())
    }

    /// Whole-chain snapshot.
    pub fn blocks(&self) -> Vec<Block> {
        self.with_chain(|chain| chain.blocks().to_vec())
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.with_chain(Chain::len)
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move blocks to a validated shard id.
    pub fn reassign_shard(&self, shard_id: i64, indices: &[BlockIndex]) -> Result<usize, LedgerError> {
        let shard_id = self.router.check_shard(shard_id)?;
        Ok(self.with_chain_mut(|chain| chain.reassign(shard_id, indices)))
    }

    /// Put every block on shard 0.
    pub fn reset_shards(&self) -> usize {
        self.with_chain_mut(Chain::reset_shards)
    }

    /// Tail index, creating a genesis block if empty.
    pub fn tail_index_or_genesis(&self) -> BlockIndex {
        self.with_chain_mut(|chain| chain.tail_index_or_genesis(&self.router))
    }
}
