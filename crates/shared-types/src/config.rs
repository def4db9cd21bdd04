//! # Pool Configuration
//!
//! `PoolConfig` is immutable once a pool is created. Updating a pool means
//! installing a new config value with a higher `version`.

use crate::entities::PoolId;
use crate::errors::FairOrderingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameter key: fee-advantage cap ratio used by TimeWeighted.
pub const PARAM_PRIORITY_FEE_CAP_RATIO: &str = "priority_fee_cap_ratio";

/// Parameter key: overrides the fairness-level epoch divisor.
pub const PARAM_FAIRNESS_EPOCH_DIVISOR: &str = "fairness_epoch_divisor";

/// Batch-internal ordering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderingAlgorithm {
    #[default]
    Fifo,
    PriorityFair,
    MevResistant,
    TimeWeighted,
}

/// How tightly fee-based reordering is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum FairnessLevel {
    #[default]
    Standard,
    High,
    Maximum,
}

impl FairnessLevel {
    /// Default divisor applied to `batch_timeout` to get the fairness-epoch width.
    pub fn default_epoch_divisor(self) -> u32 {
        match self {
            FairnessLevel::Standard => 1,
            FairnessLevel::High => 4,
            FairnessLevel::Maximum => 16,
        }
    }
}

/// Configuration of one fairness domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_id: PoolId,
    #[serde(default)]
    pub ordering_algorithm: OrderingAlgorithm,
    pub batch_size: usize,
    #[serde(with = "duration_millis")]
    pub batch_timeout: Duration,
    #[serde(default)]
    pub fairness_level: FairnessLevel,
    #[serde(default = "default_true")]
    pub mev_protection_enabled: bool,
    /// Pool-wide slippage ceiling in [0, 1].
    pub max_slippage: f64,
    /// Algorithm-specific key/value parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Assigned by the pool manager; ignored on input.
    #[serde(default)]
    pub version: u32,
}

fn default_true() -> bool {
    true
}

impl PoolConfig {
    pub fn new(pool_id: impl Into<PoolId>, ordering_algorithm: OrderingAlgorithm) -> Self {
        Self {
            pool_id: pool_id.into(),
            ordering_algorithm,
            batch_size: 100,
            batch_timeout: Duration::from_secs(1),
            fairness_level: FairnessLevel::Standard,
            mev_protection_enabled: true,
            max_slippage: 0.05,
            parameters: BTreeMap::new(),
            version: 0,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn with_fairness_level(mut self, level: FairnessLevel) -> Self {
        self.fairness_level = level;
        self
    }

    pub fn with_max_slippage(mut self, max_slippage: f64) -> Self {
        self.max_slippage = max_slippage;
        self
    }

    pub fn with_mev_protection(mut self, enabled: bool) -> Self {
        self.mev_protection_enabled = enabled;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Checks the creation-time constraints.
    ///
    /// # Errors
    /// `InvalidConfig` for an empty pool id, `batch_size < 1`,
    /// a `batch_timeout` under one millisecond, or `max_slippage` outside [0, 1].
    pub fn validate(&self) -> Result<(), FairOrderingError> {
        if self.pool_id.as_str().is_empty() {
            return Err(FairOrderingError::InvalidConfig("pool_id must not be empty".into()));
        }
        if self.batch_size < 1 {
            return Err(FairOrderingError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.batch_timeout < Duration::from_millis(1) {
            return Err(FairOrderingError::InvalidConfig(
                "batch_timeout must be at least 1ms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_slippage) {
            return Err(FairOrderingError::InvalidConfig(format!(
                "max_slippage {} outside [0, 1]",
                self.max_slippage
            )));
        }
        Ok(())
    }

    pub fn batch_timeout_ms(&self) -> u64 {
        u64::try_from(self.batch_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Raw parameter value, if present.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
