//! Configuration for the Pool Manager

use fo_01_risk_analysis::RiskConfig;
use fo_03_result_store::ResultStoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operational parameters of a `PoolManager`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    pub scheduler: SchedulerConfig,
    pub result_store: ResultStoreConfig,
    pub risk: RiskConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the timer task checks pools for elapsed batch timeouts.
    pub tick_interval: Duration,
    /// Buffered `BatchClosed` events per subscriber.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            event_capacity: 1024,
        }
    }
}
