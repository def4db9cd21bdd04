//! # Fair-Ordering Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + environment)
//! 2. Install the tracing subscriber
//! 3. Create pools and start the timer, sweep and event tasks
//! 4. Run until Ctrl+C, then drain in-flight batches

use anyhow::{Context, Result};
use node_runtime::{FairOrderingRuntime, RuntimeConfig};
use shared_types::SystemTimeSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn init_logging(json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;
    init_logging(config.log_json)?;

    let runtime = FairOrderingRuntime::start(config, Arc::new(SystemTimeSource)).await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}
