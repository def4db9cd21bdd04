//! Inbound Ports (Driving Ports / API)

use crate::domain::errors::StoreError;
use shared_types::{OrderingResult, PoolId, PoolMetrics, Timestamp, TransactionId};

/// Result and metrics access used by the pool manager.
pub trait ResultStoreApi: Send + Sync {
    /// Write one result.
    fn put(&self, result: OrderingResult) -> Result<(), StoreError>;

    /// Write every result of one batch close atomically.
    fn put_batch(&self, results: &[OrderingResult]) -> Result<(), StoreError>;

    fn get(&self, id: &TransactionId) -> Result<OrderingResult, StoreError>;

    fn contains(&self, id: &TransactionId) -> bool;

    /// Fold one batch close into the pool's metrics.
    fn update_metrics(&self, pool_id: &PoolId, results: &[OrderingResult], closed_at: Timestamp);

    fn record_cancellation(&self, pool_id: &PoolId);

    /// Metrics snapshot; zeroed metrics for a pool with no history.
    fn metrics(&self, pool_id: &PoolId) -> PoolMetrics;

    /// Drop results stored more than the retention window before `now`.
    /// Returns the number evicted.
    fn evict_expired(&self, now: Timestamp) -> Result<usize, StoreError>;
}
