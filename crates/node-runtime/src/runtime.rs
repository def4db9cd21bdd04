//! # Fair-Ordering Runtime
//!
//! Wires the pool manager to its background tasks:
//!
//! - timer task: closes batches whose timeout elapsed
//! - sweep task: evicts results past the retention window
//! - event logger: one `info!` line per closed batch

use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use fo_04_pool_manager::{BatchClosed, FairOrderingApi, PoolManager};
use shared_types::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct FairOrderingRuntime {
    manager: PoolManager,
    tasks: Vec<JoinHandle<()>>,
}

impl FairOrderingRuntime {
    /// Create the configured pools and start the background tasks.
    pub async fn start(config: RuntimeConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        let pools = config.pools().context("Failed to load pool definitions")?;
        let manager = PoolManager::new(config.manager.clone(), clock);

        for pool in pools {
            let pool_id = pool.pool_id.clone();
            manager
                .create_pool(pool)
                .await
                .with_context(|| format!("Failed to create pool {pool_id}"))?;
        }

        let tasks = vec![
            spawn_event_logger(manager.subscribe()),
            manager.spawn_timer_task(),
            manager.spawn_sweep_task(),
        ];

        info!(
            pools = manager.list_pools().len(),
            tick_ms = config.manager.scheduler.tick_interval.as_millis() as u64,
            retention_secs = config.manager.result_store.retention.as_secs(),
            "Fair-ordering runtime started"
        );
        Ok(Self { manager, tasks })
    }

    pub fn manager(&self) -> &PoolManager {
        &self.manager
    }

    /// Stop the timers, then give in-flight batches `grace` to finish.
    pub async fn shutdown(self, grace: Duration) {
        info!("Initiating graceful shutdown...");
        for task in &self.tasks {
            task.abort();
        }

        if tokio::time::timeout(grace, self.manager.wait_idle())
            .await
            .is_err()
        {
            warn!(
                in_flight = self.manager.in_flight(),
                "Grace period elapsed with batches still ordering"
            );
        }
        info!("Shutdown complete");
    }
}

fn spawn_event_logger(mut events: broadcast::Receiver<BatchClosed>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    pool_id = %event.pool_id,
                    batch_id = event.batch_id,
                    reason = %event.close_reason,
                    config_version = event.config_version,
                    ordered = event.ordered.len(),
                    expired = event.expired,
                    deferred = event.deferred,
                    redeferred = event.redeferred,
                    failed = event.failed,
                    "Batch closed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Batch event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_POOL_ID;
    use shared_types::{ManualTimeSource, PoolId, ResultStatus, TransactionRequest};
    use std::path::PathBuf;

    #[tokio::test(start_paused = true)]
    async fn test_default_pool_closes_on_timer() {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let runtime = FairOrderingRuntime::start(RuntimeConfig::default(), clock.clone())
            .await
            .unwrap();
        let manager = runtime.manager().clone();
        let pool = PoolId::from(DEFAULT_POOL_ID);

        let id = manager
            .submit(TransactionRequest::new("0xa", "0xb", 1), &pool)
            .await
            .unwrap();
        clock.advance(1_000);
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.wait_idle().await;

        let result = manager.get_result(&id).await.unwrap();
        assert_eq!(result.status, ResultStatus::Success);
        assert_eq!(result.final_position, Some(0));

        runtime.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_start_fails_on_bad_pools_file() {
        let config = RuntimeConfig {
            pools_file: Some(PathBuf::from("/nonexistent/pools.json")),
            ..RuntimeConfig::default()
        };
        let clock = Arc::new(ManualTimeSource::new(0));
        assert!(FairOrderingRuntime::start(config, clock).await.is_err());
    }
}
