//! Error types for Batch Ordering

use shared_types::FairOrderingError;
use thiserror::Error;

/// Failures that abort ordering of a whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderingError {
    /// A `parameters` entry used by the selected algorithm did not parse
    #[error("Invalid parameter {key}={value}: {reason}")]
    InvalidParameter {
        key: String,
        value: String,
        reason: String,
    },

    /// The algorithm produced positions that are not a permutation
    #[error("Placement is not a permutation of 0..{len}")]
    BrokenPermutation { len: usize },
}

impl From<OrderingError> for FairOrderingError {
    fn from(err: OrderingError) -> Self {
        FairOrderingError::AlgorithmError(err.to_string())
    }
}
