//! # Ledger Configuration
//!
//! Tunables for routing, the transaction pipeline and the latency model.
//!
//! - `LedgerConfig`: shard count, tenant prefixes, segment size
//! - `PipelineConfig`: queue bound, worker pool, segment buffer GC
//! - `RetryPolicy`: finalize retries when the source block is missing
//! - `LatencyConfig`: simulated processing and propagation ranges

use super::errors::{LedgerError, ShardId};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// A tenant prefix pinned to a fixed shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRule {
    /// Identifier prefix, e.g. `org1`.
    pub prefix: String,
    /// Shard the prefix maps to (taken modulo the shard count).
    pub shard_id: ShardId,
}

impl TenantRule {
    /// Create a new rule.
    pub fn new(prefix: impl Into<String>, shard_id: ShardId) -> Self {
        Self {
            prefix: prefix.into(),
            shard_id,
        }
    }
}

/// Ledger-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Number of logical shards (default: 2). Fixed for the process lifetime.
    pub shard_count: ShardId,
    /// Tenant prefixes checked before numeric and hash routing.
    pub tenants: Vec<TenantRule>,
    /// Payloads longer than this many bytes are segmented (default: 10).
    pub segment_size: usize,
    /// Ring buffer capacity of the conflict log (default: 100).
    pub conflict_log_capacity: usize,
    /// Modulus for the "expected sharded" target adjustment (default: 10).
    pub target_wrap: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            shard_count: 2,
            tenants: vec![TenantRule::new("org1", 0), TenantRule::new("org2", 1)],
            segment_size: 10,
            conflict_log_capacity: 100,
            target_wrap: 10,
        }
    }
}

impl LedgerConfig {
    /// Configuration for tests (same shape, small conflict log).
    pub fn for_testing() -> Self {
        Self {
            conflict_log_capacity: 8,
            ..Self::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.shard_count == 0 {
            return Err(LedgerError::InvalidInput("shard_count must be >= 1".into()));
        }
        if self.segment_size == 0 {
            return Err(LedgerError::InvalidInput("segment_size must be >= 1".into()));
        }
        if self.conflict_log_capacity == 0 {
            return Err(LedgerError::InvalidInput(
                "conflict_log_capacity must be >= 1".into(),
            ));
        }
        if self.target_wrap == 0 {
            return Err(LedgerError::InvalidInput("target_wrap must be >= 1".into()));
        }
        Ok(())
    }
}

/// Retry behaviour when the source block is missing at finalize time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total finalize attempts, including the first (default: 3).
    pub max_attempts: u32,
    /// Delay before each retry; the last entry repeats if attempts exceed it.
    pub backoff_ms: Vec<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: vec![100, 500, 1000],
        }
    }
}

impl RetryPolicy {
    /// Fast retries for tests.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: vec![5, 10, 20],
        }
    }

    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: Vec::new(),
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let ms = self
            .backoff_ms
            .get(retry as usize)
            .or_else(|| self.backoff_ms.last())
            .copied()
            .unwrap_or(0);
        Duration::from_millis(ms)
    }
}

/// Transaction pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded job queue capacity (default: 1024).
    pub queue_capacity: usize,
    /// Concurrent processing jobs (default: 64).
    pub max_workers: usize,
    /// Segment buffers untouched this long are evicted (default: 300s).
    pub segment_ttl_secs: u64,
    /// Upper bound on concurrently buffered transactions (default: 10 000).
    pub max_pending_buffers: usize,
    /// Interval of the background GC task (default: 30s).
    pub gc_interval_secs: u64,
    /// Terminal status entries are kept at least this long (default: 3600s).
    pub status_retention_secs: u64,
    /// Finalize retry policy.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_workers: 64,
            segment_ttl_secs: 300,
            max_pending_buffers: 10_000,
            gc_interval_secs: 30,
            status_retention_secs: 3600,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Small, fast configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            queue_capacity: 64,
            max_workers: 8,
            segment_ttl_secs: 5,
            max_pending_buffers: 16,
            gc_interval_secs: 1,
            status_retention_secs: 60,
            retry: RetryPolicy::for_testing(),
        }
    }

    /// Segment buffer TTL.
    pub fn segment_ttl(&self) -> Duration {
        Duration::from_secs(self.segment_ttl_secs)
    }

    /// Terminal status retention.
    pub fn status_retention(&self) -> Duration {
        Duration::from_secs(self.status_retention_secs)
    }

    /// Background GC interval.
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs.max(1))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.queue_capacity == 0 || self.max_workers == 0 {
            return Err(LedgerError::InvalidInput(
                "queue_capacity and max_workers must be >= 1".into(),
            ));
        }
        if self.max_pending_buffers == 0 {
            return Err(LedgerError::InvalidInput(
                "max_pending_buffers must be >= 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(LedgerError::InvalidInput("retry.max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

/// Simulated latency ranges in milliseconds.
///
/// Sharded work is cheaper than non-sharded work in every range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyConfig {
    /// Processing delay for sharded transactions (default: 1000..=2000).
    pub sharded_processing_ms: (u64, u64),
    /// Processing delay for non-sharded transactions (default: 3000..=6000).
    pub non_sharded_processing_ms: (u64, u64),
    /// Consensus estimate for sharded transactions.
    pub sharded_consensus_ms: (u64, u64),
    /// Consensus estimate for non-sharded transactions.
    pub non_sharded_consensus_ms: (u64, u64),
    /// Propagation estimate for sharded transactions.
    pub sharded_propagation_ms: (u64, u64),
    /// Propagation estimate for non-sharded transactions.
    pub non_sharded_propagation_ms: (u64, u64),
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            sharded_processing_ms: (1000, 2000),
            non_sharded_processing_ms: (3000, 6000),
            sharded_consensus_ms: (50, 150),
            non_sharded_consensus_ms: (200, 400),
            sharded_propagation_ms: (20, 80),
            non_sharded_propagation_ms: (100, 300),
        }
    }
}

impl LatencyConfig {
    /// Millisecond-scale ranges for tests.
    pub fn for_testing() -> Self {
        Self {
            sharded_processing_ms: (1, 3),
            non_sharded_processing_ms: (4, 8),
            sharded_consensus_ms: (1, 2),
            non_sharded_consensus_ms: (3, 4),
            sharded_propagation_ms: (1, 2),
            non_sharded_propagation_ms: (3, 4),
        }
    }

    /// Inclusive range helper; a reversed pair collapses to its lower bound.
    pub fn range(pair: (u64, u64)) -> RangeInclusive<u64> {
        let (lo, hi) = pair;
        lo..=hi.max(lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ledger_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.shard_count, 2);
        assert_eq!(config.segment_size, 10);
        assert_eq!(config.conflict_log_capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_shards_rejected() {
        let config = LedgerConfig {
            shard_count: 0,
            ..LedgerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(7), Duration::from_millis(1000));
        assert_eq!(RetryPolicy::none().backoff(0), Duration::ZERO);
    }

    #[test]
    fn test_pipeline_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::for_testing().validate().is_ok());
        let bad = PipelineConfig {
            max_workers: 0,
            ..PipelineConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_latency_ranges_favor_sharded() {
        let config = LatencyConfig::default();
        assert!(config.sharded_processing_ms.1 < config.non_sharded_processing_ms.0);
        assert_eq!(LatencyConfig::range((5, 2)), 5..=5);
    }
}
