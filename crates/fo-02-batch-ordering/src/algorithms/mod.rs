//! Ordering algorithms
//!
//! Every algorithm receives the eligible transactions already sorted in FIFO
//! order (`submitted_at`, then id) and returns one [`Placement`] per final
//! position. Algorithm selection is a closed enum resolved from the pool
//! config before any transaction is looked at, so parameter errors fail the
//! batch up front.

pub mod fifo;
pub mod mev_resistant;
pub mod partition;
pub mod priority_fair;
pub mod time_weighted;

use crate::domain::entities::Placement;
use crate::domain::errors::OrderingError;
use shared_types::{
    BatchId, OrderingAlgorithm, PendingTransaction, PoolConfig, PoolId, Timestamp,
    PARAM_FAIRNESS_EPOCH_DIVISOR, PARAM_PRIORITY_FEE_CAP_RATIO,
};

pub use partition::{partition, Partition};

/// Default fee-advantage cap ratio for TimeWeighted.
pub const DEFAULT_PRIORITY_FEE_CAP_RATIO: f64 = 3.0;

/// Batch-level facts some algorithms mix into their ordering.
#[derive(Debug, Clone, Copy)]
pub struct OrderingContext<'a> {
    pub pool_id: &'a PoolId,
    pub batch_id: BatchId,
    pub closed_at: Timestamp,
}

/// An algorithm with its parameters resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Fifo,
    PriorityFair { epoch_width_ms: u64 },
    TimeWeighted { cap: f64, timeout_ms: u64 },
    MevResistant { protection_enabled: bool },
}

impl Strategy {
    /// Resolve the pool's algorithm and its parameters.
    ///
    /// # Errors
    /// `InvalidParameter` when a parameter the algorithm reads is unparseable
    /// or out of range.
    pub fn from_config(config: &PoolConfig) -> Result<Self, OrderingError> {
        match config.ordering_algorithm {
            OrderingAlgorithm::Fifo => Ok(Strategy::Fifo),
            OrderingAlgorithm::PriorityFair => {
                let divisor = epoch_divisor(config)?;
                Ok(Strategy::PriorityFair {
                    epoch_width_ms: (config.batch_timeout_ms() / u64::from(divisor)).max(1),
                })
            }
            OrderingAlgorithm::TimeWeighted => {
                let divisor = epoch_divisor(config)?;
                let ratio = fee_cap_ratio(config)?;
                Ok(Strategy::TimeWeighted {
                    cap: 1.0 + (ratio - 1.0) / f64::from(divisor),
                    timeout_ms: config.batch_timeout_ms().max(1),
                })
            }
            OrderingAlgorithm::MevResistant => Ok(Strategy::MevResistant {
                protection_enabled: config.mev_protection_enabled,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fifo => "fifo",
            Strategy::PriorityFair { .. } => "priority_fair",
            Strategy::TimeWeighted { .. } => "time_weighted",
            Strategy::MevResistant { .. } => "mev_resistant",
        }
    }

    /// Compute placements for FIFO-sorted `eligible`.
    pub fn order(&self, eligible: &[PendingTransaction], ctx: OrderingContext<'_>) -> Vec<Placement> {
        match *self {
            Strategy::Fifo => fifo::order(eligible.len()),
            Strategy::PriorityFair { epoch_width_ms } => priority_fair::order(eligible, epoch_width_ms),
            Strategy::TimeWeighted { cap, timeout_ms } => {
                time_weighted::order(eligible, cap, timeout_ms, ctx.closed_at)
            }
            Strategy::MevResistant { protection_enabled } => {
                if protection_enabled {
                    mev_resistant::order(eligible, ctx)
                } else {
                    fifo::order(eligible.len())
                }
            }
        }
    }
}

/// Fairness-level divisor, optionally overridden by `fairness_epoch_divisor`.
pub fn epoch_divisor(config: &PoolConfig) -> Result<u32, OrderingError> {
    let Some(raw) = config.parameter(PARAM_FAIRNESS_EPOCH_DIVISOR) else {
        return Ok(config.fairness_level.default_epoch_divisor());
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(invalid(PARAM_FAIRNESS_EPOCH_DIVISOR, raw, "must be positive")),
        Ok(divisor) => Ok(divisor),
        Err(e) => Err(invalid(PARAM_FAIRNESS_EPOCH_DIVISOR, raw, &e.to_string())),
    }
}

/// `priority_fee_cap_ratio`, defaulting to 3.0. Must be finite and at least 1.
pub fn fee_cap_ratio(config: &PoolConfig) -> Result<f64, OrderingError> {
    let Some(raw) = config.parameter(PARAM_PRIORITY_FEE_CAP_RATIO) else {
        return Ok(DEFAULT_PRIORITY_FEE_CAP_RATIO);
    };
    match raw.trim().parse::<f64>() {
        Ok(ratio) if ratio.is_finite() && ratio >= 1.0 => Ok(ratio),
        Ok(_) => Err(invalid(PARAM_PRIORITY_FEE_CAP_RATIO, raw, "must be a finite value >= 1")),
        Err(e) => Err(invalid(PARAM_PRIORITY_FEE_CAP_RATIO, raw, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> OrderingError {
    OrderingError::InvalidParameter {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::FairnessLevel;
    use std::time::Duration;

    fn config(algo: OrderingAlgorithm) -> PoolConfig {
        PoolConfig::new("p", algo).with_batch_timeout(Duration::from_millis(1_000))
    }

    #[test]
    fn test_priority_fair_epoch_width_by_level() {
        let standard = Strategy::from_config(&config(OrderingAlgorithm::PriorityFair)).unwrap();
        assert_eq!(standard, Strategy::PriorityFair { epoch_width_ms: 1_000 });

        let maximum = Strategy::from_config(
            &config(OrderingAlgorithm::PriorityFair).with_fairness_level(FairnessLevel::Maximum),
        )
        .unwrap();
        assert_eq!(maximum, Strategy::PriorityFair { epoch_width_ms: 62 });
    }

    #[test]
    fn test_epoch_width_never_below_one_ms() {
        let cfg = config(OrderingAlgorithm::PriorityFair)
            .with_batch_timeout(Duration::from_millis(3))
            .with_parameter(PARAM_FAIRNESS_EPOCH_DIVISOR, "16");
        assert_eq!(
            Strategy::from_config(&cfg).unwrap(),
            Strategy::PriorityFair { epoch_width_ms: 1 }
        );
    }

    #[test]
    fn test_divisor_override_rejects_zero_and_garbage() {
        for raw in ["0", "-1", "four"] {
            let cfg = config(OrderingAlgorithm::PriorityFair)
                .with_parameter(PARAM_FAIRNESS_EPOCH_DIVISOR, raw);
            assert!(matches!(
                Strategy::from_config(&cfg),
                Err(OrderingError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_time_weighted_cap() {
        let cfg = config(OrderingAlgorithm::TimeWeighted).with_fairness_level(FairnessLevel::High);
        match Strategy::from_config(&cfg).unwrap() {
            Strategy::TimeWeighted { cap, timeout_ms } => {
                assert!((cap - 1.5).abs() < 1e-12);
                assert_eq!(timeout_ms, 1_000);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn test_fee_cap_ratio_validation() {
        for raw in ["abc", "0.5", "inf", "NaN"] {
            let cfg = config(OrderingAlgorithm::TimeWeighted)
                .with_parameter(PARAM_PRIORITY_FEE_CAP_RATIO, raw);
            assert!(Strategy::from_config(&cfg).is_err(), "accepted {raw}");
        }
        let ok = config(OrderingAlgorithm::TimeWeighted)
            .with_parameter(PARAM_PRIORITY_FEE_CAP_RATIO, " 2.0 ");
        assert!(Strategy::from_config(&ok).is_ok());
    }

    #[test]
    fn test_fifo_ignores_bad_parameters() {
        let cfg = config(OrderingAlgorithm::Fifo).with_parameter(PARAM_PRIORITY_FEE_CAP_RATIO, "abc");
        assert_eq!(Strategy::from_config(&cfg).unwrap(), Strategy::Fifo);
    }
}
