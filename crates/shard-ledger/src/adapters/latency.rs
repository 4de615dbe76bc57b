//! Latency Adapters
//!
//! `RandomLatency` draws uniformly from the configured ranges;
//! `FixedLatency` returns constants (tests, benchmarks).

use crate::algorithms::NetworkCost;
use crate::domain::{LatencyConfig, TxKind};
use crate::ports::outbound::LatencyModel;
use rand::Rng;
use std::time::Duration;

/// Uniformly random latency within configured ranges.
#[derive(Clone, Debug, Default)]
pub struct RandomLatency {
    config: LatencyConfig,
}

impl RandomLatency {
    /// Create from configuration.
    pub fn new(config: LatencyConfig) -> Self {
        Self { config }
    }

    fn sample(pair: (u64, u64)) -> u64 {
        rand::thread_rng().gen_range(LatencyConfig::range(pair))
    }
}

impl LatencyModel for RandomLatency {
    fn processing_delay(&self, kind: TxKind) -> Duration {
        let pair = match kind {
            TxKind::Sharded => self.config.sharded_processing_ms,
            TxKind::NonSharded => self.config.non_sharded_processing_ms,
        };
        Duration::from_millis(Self::sample(pair))
    }

    fn network_cost(&self, kind: TxKind) -> NetworkCost {
        let (consensus, propagation) = match kind {
            TxKind::Sharded => (
                self.config.sharded_consensus_ms,
                self.config.sharded_propagation_ms,
            ),
            TxKind::NonSharded => (
                self.config.non_sharded_consensus_ms,
                self.config.non_sharded_propagation_ms,
            ),
        };
        NetworkCost {
            consensus_ms: Self::sample(consensus) as f64,
            propagation_ms: Self::sample(propagation) as f64,
        }
    }
}

/// Constant latency.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLatency {
    /// Delay for every transaction.
    pub delay: Duration,
    /// Consensus estimate.
    pub consensus_ms: f64,
    /// Propagation estimate.
    pub propagation_ms: f64,
}

impl FixedLatency {
    /// No delay and zero network cost.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Fixed delay, zero network cost.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl LatencyModel for FixedLatency {
    fn processing_delay(&self, _kind: TxKind) -> Duration {
        self.delay
    }

    fn network_cost(&self, _kind: TxKind) -> NetworkCost {
        NetworkCost {
            consensus_ms: self.consensus_ms,
            propagation_ms: self.propagation_ms,
        }
    }
}
