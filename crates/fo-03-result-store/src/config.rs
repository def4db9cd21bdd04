//! Configuration for the Result Store subsystem

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultStoreConfig {
    /// Results older than this are evicted by the sweep.
    pub retention: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
}

impl Default for ResultStoreConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(3_600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ResultStoreConfig {
    pub fn retention_ms(&self) -> u64 {
        u64::try_from(self.retention.as_millis()).unwrap_or(u64::MAX)
    }
}
