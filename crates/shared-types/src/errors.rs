//! # Error Types
//!
//! The client-visible error taxonomy shared by all subsystems.

use crate::entities::{PoolId, Timestamp, TransactionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the fair-ordering operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FairOrderingError {
    /// Pool configuration violates a creation-time constraint.
    #[error("Invalid pool config: {0}")]
    InvalidConfig(String),

    /// No pool with this id.
    #[error("Pool not found: {0}")]
    PoolNotFound(PoolId),

    /// `execute_after` is not strictly before `execute_before`.
    #[error("Invalid execution window: after={after} >= before={before}")]
    WindowInvalid { after: Timestamp, before: Timestamp },

    /// Transaction slippage tolerance is above the pool ceiling.
    #[error("Slippage {requested} exceeds pool ceiling {ceiling}")]
    SlippageExceedsPoolCeiling { requested: f64, ceiling: f64 },

    /// The transaction's batch has already closed (or it was cancelled).
    #[error("Transaction already closed: {0}")]
    AlreadyClosed(TransactionId),

    /// Unknown or evicted transaction.
    #[error("Not found: {0}")]
    NotFound(TransactionId),

    /// The ordering algorithm failed for a whole batch.
    #[error("Ordering algorithm error: {0}")]
    AlgorithmError(String),

    /// A single transaction carried data the engine cannot order.
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
}

impl FairOrderingError {
    /// Only algorithm failures may be retried, by resubmitting as a new transaction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FairOrderingError::AlgorithmError(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FairOrderingError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            FairOrderingError::PoolNotFound(_) => ErrorCode::PoolNotFound,
            FairOrderingError::WindowInvalid { .. } => ErrorCode::WindowInvalid,
            FairOrderingError::SlippageExceedsPoolCeiling { .. } => {
                ErrorCode::SlippageExceedsPoolCeiling
            }
            FairOrderingError::AlreadyClosed(_) => ErrorCode::AlreadyClosed,
            FairOrderingError::NotFound(_) => ErrorCode::NotFound,
            FairOrderingError::AlgorithmError(_) => ErrorCode::AlgorithmError,
            FairOrderingError::MalformedTransaction(_) => ErrorCode::MalformedTransaction,
        }
    }
}

/// Machine-readable error code stored on non-success results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidConfig,
    PoolNotFound,
    WindowInvalid,
    SlippageExceedsPoolCeiling,
    AlreadyClosed,
    NotFound,
    AlgorithmError,
    MalformedTransaction,
    /// Execution window lapsed before the batch closed.
    WindowExpired,
    /// Withdrawn by the client before its batch closed.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FairOrderingError::WindowInvalid { after: 10, before: 5 };
        assert_eq!(err.to_string(), "Invalid execution window: after=10 >= before=5");

        let err = FairOrderingError::PoolNotFound(PoolId::from("eth-usdc"));
        assert_eq!(err.to_string(), "Pool not found: eth-usdc");
    }

    #[test]
    fn test_only_algorithm_error_is_retryable() {
        assert!(FairOrderingError::AlgorithmError("bad".into()).is_retryable());
        assert!(!FairOrderingError::InvalidConfig("x".into()).is_retryable());
        assert!(!FairOrderingError::NotFound(TransactionId::from_u128(1)).is_retryable());
    }

    #[test]
    fn test_code_mapping() {
        let err = FairOrderingError::SlippageExceedsPoolCeiling {
            requested: 0.2,
            ceiling: 0.1,
        };
        assert_eq!(err.code(), ErrorCode::SlippageExceedsPoolCeiling);
    }
}
