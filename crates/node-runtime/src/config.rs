//! # Runtime Configuration
//!
//! Defaults from `ManagerConfig`, overridden by environment variables:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `FO_TICK_INTERVAL_MS` | Timer tick for batch timeouts |
//! | `FO_RESULT_RETENTION_SECS` | How long results stay queryable |
//! | `FO_SWEEP_INTERVAL_SECS` | Retention sweep period |
//! | `FO_LOG_JSON` | `1`/`true` for JSON log lines |
//! | `FO_POOLS_FILE` | JSON array of pool definitions |

use fo_04_pool_manager::ManagerConfig;
use shared_types::{OrderingAlgorithm, PoolConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_TICK_INTERVAL_MS: &str = "FO_TICK_INTERVAL_MS";
pub const ENV_RESULT_RETENTION_SECS: &str = "FO_RESULT_RETENTION_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "FO_SWEEP_INTERVAL_SECS";
pub const ENV_LOG_JSON: &str = "FO_LOG_JSON";
pub const ENV_POOLS_FILE: &str = "FO_POOLS_FILE";

/// Pool created when no pools file is given.
pub const DEFAULT_POOL_ID: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid {expected}")]
    InvalidVar {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read pools file {path}: {source}")]
    PoolsFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse pools file {path}: {source}")]
    PoolsFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub manager: ManagerConfig,
    pub log_json: bool,
    pub pools_file: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_u64(&lookup, ENV_TICK_INTERVAL_MS)? {
            config.manager.scheduler.tick_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = parse_u64(&lookup, ENV_RESULT_RETENTION_SECS)? {
            config.manager.result_store.retention = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&lookup, ENV_SWEEP_INTERVAL_SECS)? {
            config.manager.result_store.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(raw) = lookup(ENV_LOG_JSON) {
            config.log_json = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        key: ENV_LOG_JSON,
                        value: raw,
                        expected: "boolean",
                    })
                }
            };
        }
        config.pools_file = lookup(ENV_POOLS_FILE)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Pool definitions to create at startup.
    pub fn pools(&self) -> Result<Vec<PoolConfig>, ConfigError> {
        match &self.pools_file {
            Some(path) => load_pools_file(path),
            None => Ok(vec![default_pool()]),
        }
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidVar {
            key,
            value: raw,
            expected: "unsigned integer",
        })
}

pub fn load_pools_file(path: &Path) -> Result<Vec<PoolConfig>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::PoolsFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::PoolsFileParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn default_pool() -> PoolConfig {
    PoolConfig::new(DEFAULT_POOL_ID, OrderingAlgorithm::PriorityFair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let vars: HashMap<&'static str, String> =
            vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.log_json);
        assert!(config.pools_file.is_none());
        assert_eq!(config.manager.scheduler.tick_interval, Duration::from_millis(10));

        let pools = config.pools().unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].pool_id.as_str(), DEFAULT_POOL_ID);
    }

    #[test]
    fn test_env_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (ENV_TICK_INTERVAL_MS, "25"),
            (ENV_RESULT_RETENTION_SECS, "120"),
            (ENV_SWEEP_INTERVAL_SECS, "5"),
            (ENV_LOG_JSON, "true"),
        ]))
        .unwrap();

        assert_eq!(config.manager.scheduler.tick_interval, Duration::from_millis(25));
        assert_eq!(config.manager.result_store.retention, Duration::from_secs(120));
        assert_eq!(config.manager.result_store.sweep_interval, Duration::from_secs(5));
        assert!(config.log_json);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = RuntimeConfig::from_lookup(lookup(&[(ENV_TICK_INTERVAL_MS, "fast")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                key: ENV_TICK_INTERVAL_MS,
                ..
            }
        ));
    }

    #[test]
    fn test_pools_file() {
        let pools = vec![
            PoolConfig::new("eth-usdc", OrderingAlgorithm::MevResistant).with_batch_size(32),
            PoolConfig::new("misc", OrderingAlgorithm::Fifo),
        ];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&pools).unwrap().as_bytes())
            .unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let config = RuntimeConfig::from_lookup(lookup(&[(ENV_POOLS_FILE, &path)])).unwrap();
        assert_eq!(config.pools().unwrap(), pools);
    }

    #[test]
    fn test_missing_pools_file() {
        let config = RuntimeConfig {
            pools_file: Some(PathBuf::from("/nonexistent/pools.json")),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.pools(),
            Err(ConfigError::PoolsFileRead { .. })
        ));
    }
}
