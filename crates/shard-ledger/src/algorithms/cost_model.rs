//! # Synthetic Cost Model
//!
//! Finality and throughput estimates attached to audit records.
//!
//! `finality = exec + consensus + propagation`, `tps = 1000 / finality`.
//! None of these numbers are measured on a real network.

use crate::domain::{AuditRecord, TxKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sampled network costs for one transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkCost {
    /// Consensus estimate.
    pub consensus_ms: f64,
    /// Propagation estimate.
    pub propagation_ms: f64,
}

/// Synthetic metrics for one finalized transaction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticMetrics {
    /// Measured processing time.
    pub exec_time_ms: f64,
    /// `exec + consensus + propagation`.
    pub finality_ms: f64,
    /// Propagation estimate.
    pub propagation_ms: f64,
    /// `1000 / finality`, zero when finality is zero.
    pub tps: f64,
}

impl SyntheticMetrics {
    /// Combine measured execution time with sampled network cost.
    pub fn compute(exec_time_ms: f64, cost: NetworkCost) -> Self {
        let finality_ms = exec_time_ms + cost.consensus_ms + cost.propagation_ms;
        let tps = if finality_ms > 0.0 {
            1000.0 / finality_ms
        } else {
            0.0
        };
        Self {
            exec_time_ms,
            finality_ms,
            propagation_ms: cost.propagation_ms,
            tps,
        }
    }
}

/// Per-kind averages over a set of audit records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KindSummary {
    /// Records aggregated.
    pub count: usize,
    /// Mean execution time.
    pub avg_exec_ms: f64,
    /// Mean finality.
    pub avg_finality_ms: f64,
    /// Mean propagation.
    pub avg_propagation_ms: f64,
    /// Mean TPS.
    pub avg_tps: f64,
}

/// Sharded vs non-sharded comparison.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputReport {
    /// Summaries keyed by kind label.
    pub by_kind: BTreeMap<String, KindSummary>,
}

impl ThroughputReport {
    /// Aggregate audit records.
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let mut sums: BTreeMap<String, (usize, f64, f64, f64, f64)> = BTreeMap::new();
        for record in records {
            let entry = sums
                .entry(record.kind.as_str().to_string())
                .or_insert((0, 0.0, 0.0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += record.exec_time_ms;
            entry.2 += record.finality_ms;
            entry.3 += record.propagation_ms;
            entry.4 += record.tps;
        }

        let by_kind = sums
            .into_iter()
            .map(|(kind, (count, exec, fin, prop, tps))| {
                let n = count as f64;
                (
                    kind,
                    KindSummary {
                        count,
                        avg_exec_ms: exec / n,
                        avg_finality_ms: fin / n,
                        avg_propagation_ms: prop / n,
                        avg_tps: tps / n,
                    },
                )
            })
            .collect();
        Self { by_kind }
    }

    /// Summary for one kind, if any records exist.
    pub fn summary(&self, kind: TxKind) -> Option<&KindSummary> {
        self.by_kind.get(kind.as_str())
    }
}

impl fmt::Display for ThroughputReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_kind.is_empty() {
            return writeln!(f, "no finalized transactions");
        }
        for (kind, s) in &self.by_kind {
            writeln!(
                f,
                "{:<12} count={:<4} exec={:>9.2}ms finality={:>9.2}ms propagation={:>8.2}ms tps={:.4}",
                kind, s.count, s.avg_exec_ms, s.avg_finality_ms, s.avg_propagation_ms, s.avg_tps
            )?;
        }
        Ok(())
    }
}
