//! Prometheus metrics for the shard ledger.
//!
//! Names follow `sl_<component>_<metric>_<unit>`. Per-kind series are
//! labelled `kind` with the values `Sharded` and `Non-Sharded`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts,
    HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ---------------------------------------------------------------------
    // Chain
    // ---------------------------------------------------------------------

    /// Blocks appended to the chain
    pub static ref BLOCKS_APPENDED: Counter = Counter::new(
        "sl_chain_blocks_appended_total",
        "Total number of blocks appended to the chain"
    ).expect("metric creation failed");

    /// Current number of blocks
    pub static ref CHAIN_HEIGHT: Gauge = Gauge::new(
        "sl_chain_height",
        "Number of blocks currently in the chain"
    ).expect("metric creation failed");

    /// Duplicate identifiers rejected
    pub static ref CONFLICTS_DETECTED: Counter = Counter::new(
        "sl_chain_conflicts_total",
        "Total duplicate identifier conflicts"
    ).expect("metric creation failed");

    // ---------------------------------------------------------------------
    // Pipeline
    // ---------------------------------------------------------------------

    /// Transactions accepted for processing
    pub static ref TRANSACTIONS_SUBMITTED: Counter = Counter::new(
        "sl_pipeline_transactions_submitted_total",
        "Total transactions accepted into the pipeline"
    ).expect("metric creation failed");

    /// Transactions completed, by kind
    pub static ref TRANSACTIONS_COMPLETED: CounterVec = CounterVec::new(
        Opts::new("sl_pipeline_transactions_completed_total", "Completed transactions"),
        &["kind"]
    ).expect("metric creation failed");

    /// Transactions that ended in failure
    pub static ref TRANSACTIONS_FAILED: Counter = Counter::new(
        "sl_pipeline_transactions_failed_total",
        "Total transactions that failed"
    ).expect("metric creation failed");

    /// Transactions queued or in flight
    pub static ref QUEUE_DEPTH: Gauge = Gauge::new(
        "sl_pipeline_queue_depth",
        "Jobs waiting in the pipeline queue for a worker"
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_IN_FLIGHT: Gauge = Gauge::new(
        "sl_pipeline_transactions_in_flight",
        "Transactions pending or in progress"
    ).expect("metric creation failed");

    /// Simulated execution time
    pub static ref EXEC_TIME: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sl_pipeline_exec_time_seconds",
            "Measured processing time per transaction"
        ).buckets(exponential_buckets(0.001, 2.0, 14).unwrap()),
        &["kind"]
    ).expect("metric creation failed");

    /// Synthetic finality estimate
    pub static ref FINALITY: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sl_pipeline_finality_seconds",
            "Estimated finality per transaction"
        ).buckets(exponential_buckets(0.001, 2.0, 14).unwrap()),
        &["kind"]
    ).expect("metric creation failed");

    // ---------------------------------------------------------------------
    // Segments
    // ---------------------------------------------------------------------

    /// Open reassembly buffers
    pub static ref SEGMENT_BUFFERS_PENDING: Gauge = Gauge::new(
        "sl_segments_buffers_pending",
        "Reassembly buffers awaiting segments"
    ).expect("metric creation failed");

    /// Buffers dropped by expiry or eviction
    pub static ref SEGMENT_BUFFERS_EXPIRED: Counter = Counter::new(
        "sl_segments_buffers_expired_total",
        "Reassembly buffers discarded before completion"
    ).expect("metric creation failed");

    // ---------------------------------------------------------------------
    // Audit / runtime
    // ---------------------------------------------------------------------

    /// Failed audit writes
    pub static ref AUDIT_WRITE_FAILURES: Counter = Counter::new(
        "sl_audit_write_failures_total",
        "Audit records that could not be persisted"
    ).expect("metric creation failed");

    /// Wall-clock duration of each scenario run
    pub static ref SCENARIO_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sl_runtime_scenario_duration_seconds",
            "Wall-clock duration of a scenario"
        ).buckets(exponential_buckets(0.01, 2.0, 14).unwrap()),
        &["scenario"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BLOCKS_APPENDED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(CONFLICTS_DETECTED.clone()),
        Box::new(TRANSACTIONS_SUBMITTED.clone()),
        Box::new(TRANSACTIONS_COMPLETED.clone()),
        Box::new(TRANSACTIONS_FAILED.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(TRANSACTIONS_IN_FLIGHT.clone()),
        Box::new(EXEC_TIME.clone()),
        Box::new(FINALITY.clone()),
        Box::new(SEGMENT_BUFFERS_PENDING.clone()),
        Box::new(SEGMENT_BUFFERS_EXPIRED.clone()),
        Box::new(AUDIT_WRITE_FAILURES.clone()),
        Box::new(SCENARIO_DURATION.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_counter_increment() {
        BLOCKS_APPENDED.inc();
        assert!(BLOCKS_APPENDED.get() >= 1.0);
    }

    #[test]
    fn test_kind_labels() {
        TRANSACTIONS_COMPLETED.with_label_values(&["Sharded"]).inc();
        assert!(TRANSACTIONS_COMPLETED.with_label_values(&["Sharded"]).get() >= 1.0);
    }

    #[test]
    fn test_histogram_timer() {
        let histogram = SCENARIO_DURATION.with_label_values(&["unit"]);
        {
            let _timer = HistogramTimer::new(&histogram);
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert_eq!(histogram.get_sample_count(), 1);
    }

    #[test]
    fn test_encode_contains_names() {
        register_metrics().unwrap();
        CHAIN_HEIGHT.set(3.0);
        let text = encode_metrics().unwrap();
        assert!(text.contains("sl_chain_height"));
    }
}
