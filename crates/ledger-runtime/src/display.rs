//! Operator-facing rendering of the chain, conflicts and scenario results.

use std::fmt::Write as _;

use shard_ledger::{Block, ConflictLog};

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// One line per block, then one indented line per transaction.
pub fn render_chain(blocks: &[Block]) -> String {
    let mut out = String::new();
    if blocks.is_empty() {
        out.push_str("(empty ledger)\n");
        return out;
    }
    for block in blocks {
        let _ = writeln!(
            out,
            "#{:<4} shard={} v{:<3} {:<24} hash={} prev={}",
            block.index,
            block.shard_id,
            block.version,
            block.originating_id,
            short(&block.hash),
            short(&block.previous_hash),
        );
        for tx in &block.transactions {
            let _ = writeln!(
                out,
                "      {} {}->{} {} [{}] {:.0}ms",
                tx.transaction_id, tx.source, tx.target, tx.kind, tx.status, tx.exec_time_ms
            );
        }
    }
    out
}

/// Conflict total followed by the retained entries.
pub fn render_conflicts(log: &ConflictLog) -> String {
    let mut out = format!(
        "{} conflicts ({} retained)\n",
        log.total,
        log.entries.len()
    );
    for entry in &log.entries {
        let _ = writeln!(
            out,
            "  {} {}",
            entry.detected_at.format("%H:%M:%S"),
            entry.message
        );
    }
    out
}
