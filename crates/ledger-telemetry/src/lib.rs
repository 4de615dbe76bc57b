//! # Ledger Telemetry
//!
//! Logging, span export and Prometheus metrics for the shard ledger.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).await?;
//!     // ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` | OTLP endpoint |
//! | `OTEL_SERVICE_NAME` | `shard-ledger` | Service name in traces |
//! | `SL_OTLP_ENABLED` | `false` | Export spans |
//! | `SL_LOG_LEVEL` | `info` | Log filter |
//! | `SL_JSON_LOGS` | container-detected | JSON log output |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, AUDIT_WRITE_FAILURES,
    BLOCKS_APPENDED, CHAIN_HEIGHT, CONFLICTS_DETECTED, EXEC_TIME, FINALITY, QUEUE_DEPTH,
    SCENARIO_DURATION, SEGMENT_BUFFERS_EXPIRED, SEGMENT_BUFFERS_PENDING, TRANSACTIONS_COMPLETED,
    TRANSACTIONS_FAILED, TRANSACTIONS_IN_FLIGHT, TRANSACTIONS_SUBMITTED,
};
pub use tracing_setup::{env_filter, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber or OTLP pipeline could not be installed
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global subscriber.
///
/// Hold the returned guard for the lifetime of the process; dropping it
/// flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    tracing::debug!(config = %config.summary(), "telemetry configured");

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Create an info span tagged with the ledger component.
///
/// ```rust,ignore
/// let _span = ledger_span!("scenario", scenario = "sharded").entered();
/// ```
#[macro_export]
macro_rules! ledger_span {
    ($name:expr) => {
        tracing::info_span!($name, service = "shard-ledger")
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, service = "shard-ledger", $($field)*)
    };
}

/// Increment a counter, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Observe a histogram value, optionally with label values.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
