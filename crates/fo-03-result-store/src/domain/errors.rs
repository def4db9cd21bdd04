//! Error types for the Result Store

use shared_types::TransactionId;
use thiserror::Error;

/// Key-value backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unknown or already evicted
    #[error("Result not found: {0}")]
    NotFound(TransactionId),

    /// A result for this transaction already exists
    #[error("Result already stored: {0}")]
    Duplicate(TransactionId),

    #[error(transparent)]
    Backend(#[from] KVStoreError),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::from(KVStoreError::IOError {
            message: "disk full".into(),
        });
        assert_eq!(err.to_string(), "KV store I/O error: disk full");
    }
}
