//! Outbound Ports (Driven Ports / SPI)
//!
//! The persistence backend is an external collaborator. The store only
//! needs point reads, point and batch writes, and a prefix scan for the
//! retention sweep.

use crate::domain::errors::KVStoreError;

/// Abstract key-value store.
///
/// Implementations must be safe to call from many tasks at once; every
/// method takes `&self`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Apply every operation or none.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}
