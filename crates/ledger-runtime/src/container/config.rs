//! # Runtime Configuration
//!
//! Ledger, pipeline and latency settings plus the scenario plan, overridden
//! from `SL_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shard_ledger::{LatencyConfig, LedgerError, LedgerServiceConfig};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Parsed values failed ledger validation.
    #[error("invalid ledger configuration: {0}")]
    Ledger(#[from] LedgerError),
}

/// Scenario selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioKind {
    /// Parallel submission split across worker groups.
    Sharded,
    /// One transaction at a time, each awaited before the next.
    NonSharded,
    /// All transactions submitted at once.
    Stress,
}

impl ScenarioKind {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::Sharded => "sharded",
            ScenarioKind::NonSharded => "non-sharded",
            ScenarioKind::Stress => "stress",
        }
    }

    /// Every scenario in run order.
    pub fn all() -> Vec<ScenarioKind> {
        vec![
            ScenarioKind::Sharded,
            ScenarioKind::NonSharded,
            ScenarioKind::Stress,
        ]
    }
}

impl FromStr for ScenarioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sharded" => Ok(ScenarioKind::Sharded),
            "non-sharded" | "nonsharded" | "non_sharded" => Ok(ScenarioKind::NonSharded),
            "stress" => Ok(ScenarioKind::Stress),
            other => Err(other.to_string()),
        }
    }
}

/// Scenario plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Scenarios to run, in order. Empty runs none.
    pub run: Vec<ScenarioKind>,
    /// Transactions per scenario (default: 10).
    pub transactions: usize,
    /// Concurrent submitters in the sharded scenario (default: 4).
    pub workers: usize,
    /// Random payload length in characters (default: 50).
    pub payload_len: usize,
    /// Lowest random source block (default: 1).
    pub source_range: (u64, u64),
    /// Random target block range (default: 6..=10).
    pub target_range: (u64, u64),
    /// How long to wait for each transaction to settle (default: 60s).
    pub settle_timeout_secs: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            run: ScenarioKind::all(),
            transactions: 10,
            workers: 4,
            payload_len: 50,
            source_range: (1, 5),
            target_range: (6, 10),
            settle_timeout_secs: 60,
        }
    }
}

impl ScenarioConfig {
    /// Blocks that must exist before any scenario runs.
    ///
    /// Sharded-hint requests may wrap the target, so every index below the
    /// largest source or target must be present.
    pub fn required_blocks(&self) -> usize {
        (self.source_range.1.max(self.target_range.1) + 1) as usize
    }

    /// Settle timeout.
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Ledger service settings.
    pub service: LedgerServiceConfig,
    /// Latency ranges for the random latency model.
    pub latency: LatencyConfig,
    /// JSON-lines audit file; in-memory when unset.
    pub audit_path: Option<PathBuf>,
    /// Workload ids appended as blocks at startup.
    pub seed_workloads: Vec<String>,
    /// Scenario plan.
    pub scenarios: ScenarioConfig,
    /// Stay up after the scenarios until Ctrl+C.
    pub keep_alive: bool,
    /// Metrics monitor period in seconds (default: 5).
    pub monitor_interval_secs: u64,
}

impl RuntimeConfig {
    /// Defaults with the monitor interval set.
    pub fn new() -> Self {
        Self {
            monitor_interval_secs: 5,
            ..Self::default()
        }
    }

    /// Fast configuration for tests: millisecond latencies, small plan.
    pub fn for_testing() -> Self {
        Self {
            service: LedgerServiceConfig::for_testing(),
            latency: LatencyConfig::for_testing(),
            scenarios: ScenarioConfig {
                transactions: 4,
                workers: 2,
                payload_len: 8,
                settle_timeout_secs: 10,
                ..ScenarioConfig::default()
            },
            monitor_interval_secs: 1,
            ..Self::default()
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// # Environment Variables
    ///
    /// - `SL_SHARD_COUNT`, `SL_SEGMENT_SIZE`, `SL_CONFLICT_LOG_CAPACITY`
    /// - `SL_QUEUE_CAPACITY`, `SL_MAX_WORKERS`, `SL_SEGMENT_TTL_SECS`,
    ///   `SL_GC_INTERVAL_SECS`, `SL_STATUS_RETENTION_SECS`, `SL_RETRY_ATTEMPTS`
    /// - `SL_FAST_LATENCY`: millisecond latency ranges
    /// - `SL_AUDIT_PATH`: JSON-lines audit file
    /// - `SL_SEED_WORKLOADS`: comma-separated workload ids
    /// - `SL_SCENARIOS`: comma-separated list or `none`
    /// - `SL_TRANSACTIONS`, `SL_SCENARIO_WORKERS`, `SL_PAYLOAD_LEN`
    /// - `SL_KEEP_ALIVE`, `SL_MONITOR_INTERVAL_SECS`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        let ledger = &mut config.service.ledger;
        let pipeline = &mut config.service.pipeline;

        override_parsed(&lookup, "SL_SHARD_COUNT", &mut ledger.shard_count)?;
        override_parsed(&lookup, "SL_SEGMENT_SIZE", &mut ledger.segment_size)?;
        override_parsed(
            &lookup,
            "SL_CONFLICT_LOG_CAPACITY",
            &mut ledger.conflict_log_capacity,
        )?;
        override_parsed(&lookup, "SL_QUEUE_CAPACITY", &mut pipeline.queue_capacity)?;
        override_parsed(&lookup, "SL_MAX_WORKERS", &mut pipeline.max_workers)?;
        override_parsed(&lookup, "SL_SEGMENT_TTL_SECS", &mut pipeline.segment_ttl_secs)?;
        override_parsed(&lookup, "SL_GC_INTERVAL_SECS", &mut pipeline.gc_interval_secs)?;
        override_parsed(
            &lookup,
            "SL_STATUS_RETENTION_SECS",
            &mut pipeline.status_retention_secs,
        )?;
        override_parsed(&lookup, "SL_RETRY_ATTEMPTS", &mut pipeline.retry.max_attempts)?;

        let mut fast_latency = false;
        override_flag(&lookup, "SL_FAST_LATENCY", &mut fast_latency)?;
        if fast_latency {
            config.latency = LatencyConfig::for_testing();
        }

        config.audit_path = lookup("SL_AUDIT_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup("SL_SEED_WORKLOADS") {
            config.seed_workloads = raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(raw) = lookup("SL_SCENARIOS") {
            config.scenarios.run = parse_scenarios(&raw)?;
        }
        override_parsed(&lookup, "SL_TRANSACTIONS", &mut config.scenarios.transactions)?;
        override_parsed(&lookup, "SL_SCENARIO_WORKERS", &mut config.scenarios.workers)?;
        override_parsed(&lookup, "SL_PAYLOAD_LEN", &mut config.scenarios.payload_len)?;
        override_flag(&lookup, "SL_KEEP_ALIVE", &mut config.keep_alive)?;
        override_parsed(
            &lookup,
            "SL_MONITOR_INTERVAL_SECS",
            &mut config.monitor_interval_secs,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the ledger settings and the scenario plan.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        if self.scenarios.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SL_SCENARIO_WORKERS".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }

    /// Metrics monitor period.
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs.max(1))
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

fn override_flag<F>(lookup: &F, key: &str, target: &mut bool) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        *target = match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                })
            }
        };
    }
    Ok(())
}

fn parse_scenarios(raw: &str) -> Result<Vec<ScenarioKind>, ConfigError> {
    if raw.trim().eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse().map_err(|bad| ConfigError::InvalidValue {
                key: "SL_SCENARIOS".into(),
                value: bad,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config.service.ledger.shard_count, 2);
        assert_eq!(config.scenarios.run, ScenarioKind::all());
        assert_eq!(config.scenarios.required_blocks(), 11);
        assert!(config.audit_path.is_none());
        assert!(!config.keep_alive);
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(env(&[
            ("SL_SHARD_COUNT", "4"),
            ("SL_QUEUE_CAPACITY", "16"),
            ("SL_STATUS_RETENTION_SECS", "120"),
            ("SL_FAST_LATENCY", "true"),
            ("SL_SEED_WORKLOADS", "org1-a, org2-b,,"),
            ("SL_SCENARIOS", "stress,sharded"),
            ("SL_KEEP_ALIVE", "yes"),
            ("SL_AUDIT_PATH", "/tmp/audit.jsonl"),
        ]))
        .unwrap();
        assert_eq!(config.service.ledger.shard_count, 4);
        assert_eq!(config.service.pipeline.queue_capacity, 16);
        assert_eq!(config.service.pipeline.status_retention_secs, 120);
        assert_eq!(config.latency, LatencyConfig::for_testing());
        assert_eq!(config.seed_workloads, vec!["org1-a", "org2-b"]);
        assert_eq!(
            config.scenarios.run,
            vec![ScenarioKind::Stress, ScenarioKind::Sharded]
        );
        assert!(config.keep_alive);
        assert_eq!(config.audit_path, Some(PathBuf::from("/tmp/audit.jsonl")));
    }

    #[test]
    fn test_scenarios_none() {
        let config = RuntimeConfig::from_lookup(env(&[("SL_SCENARIOS", "none")])).unwrap();
        assert!(config.scenarios.run.is_empty());
    }

    #[test]
    fn test_bad_number_rejected() {
        let err = RuntimeConfig::from_lookup(env(&[("SL_SHARD_COUNT", "two")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SL_SHARD_COUNT"));
    }

    #[test]
    fn test_zero_shards_fails_validation() {
        let err = RuntimeConfig::from_lookup(env(&[("SL_SHARD_COUNT", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Ledger(_)));
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        let err = RuntimeConfig::from_lookup(env(&[("SL_SCENARIOS", "sharded,bogus")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref value, .. } if value == "bogus"));
    }

    #[test]
    fn test_bad_flag_rejected() {
        assert!(RuntimeConfig::from_lookup(env(&[("SL_KEEP_ALIVE", "maybe")])).is_err());
    }
}
