//! # Hash Chain
//!
//! Block hashing and chain verification.
//!
//! The hash input is `"{index}{timestamp}{tx_json}{previous_hash}"` where
//! `tx_json` is the JSON array of the block's transactions in struct field
//! order. SHA-256, lowercase hex.

use crate::domain::{format_timestamp, Block, BlockIndex, Transaction, GENESIS_PREVIOUS_HASH, GENESIS_VERSION};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

/// Compute a block hash.
pub fn compute_hash(
    index: BlockIndex,
    timestamp: &DateTime<Utc>,
    transactions: &[Transaction],
    previous_hash: &str,
) -> String {
    // Serializing plain structs of strings and numbers cannot fail.
    let tx_json = serde_json::to_string(transactions).unwrap_or_default();
    let input = format!(
        "{}{}{}{}",
        index,
        format_timestamp(timestamp),
        tx_json,
        previous_hash
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Recompute the hash of `block` from its current contents.
pub fn block_hash(block: &Block) -> String {
    compute_hash(
        block.index,
        &block.timestamp,
        &block.transactions,
        &block.previous_hash,
    )
}

/// Check that the stored hash matches the block contents.
pub fn verify(block: &Block) -> bool {
    block.hash == block_hash(block)
}

/// First broken property found by [`verify_chain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainViolation {
    /// Stored hash does not match contents.
    HashMismatch {
        /// Offending block
        index: BlockIndex,
    },
    /// `previous_hash` does not match the predecessor.
    BrokenLink {
        /// Offending block
        index: BlockIndex,
    },
    /// Version or index out of sequence.
    VersionGap {
        /// Offending block
        index: BlockIndex,
        /// Expected version
        expected: u64,
        /// Found version
        found: u64,
    },
}

impl fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashMismatch { index } => write!(f, "block {} hash mismatch", index),
            Self::BrokenLink { index } => write!(f, "block {} previous_hash broken", index),
            Self::VersionGap {
                index,
                expected,
                found,
            } => write!(
                f,
                "block {} version {} (expected {})",
                index, found, expected
            ),
        }
    }
}

/// Walk the chain and report the first violation. Diagnostic only.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainViolation> {
    let mut expected_prev = GENESIS_PREVIOUS_HASH;
    for (pos, block) in blocks.iter().enumerate() {
        let expected_version = GENESIS_VERSION + pos as u64;
        if block.version != expected_version || block.index != pos as u64 {
            return Err(ChainViolation::VersionGap {
                index: block.index,
                expected: expected_version,
                found: block.version,
            });
        }
        if block.previous_hash != expected_prev {
            return Err(ChainViolation::BrokenLink { index: block.index });
        }
        if !verify(block) {
            return Err(ChainViolation::HashMismatch { index: block.index });
        }
        expected_prev = &block.hash;
    }
    Ok(())
}
