//! # Shard Ledger Runtime
//!
//! Runs the ledger simulation end to end.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, optional OTLP spans, metrics registry)
//! 2. Load `RuntimeConfig` from `SL_*` environment variables
//! 3. Wire the ledger service and rehydrate the audit trail
//! 4. Seed workload blocks, start GC and the metrics monitor
//! 5. Run the configured scenarios and print the ledger summary
//! 6. Optionally stay up until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use ledger_runtime::{LedgerRuntime, RuntimeConfig};
use ledger_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .await
        .context("failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env().context("invalid runtime configuration")?;
    let keep_alive = config.keep_alive;

    let runtime = LedgerRuntime::new(config)?;
    runtime.start().await?;

    let reports = runtime.run_scenarios().await?;
    println!("{}", runtime.summary(&reports).await?);

    if keep_alive {
        info!("Ledger is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;
    }

    runtime.shutdown().await;
    Ok(())
}
