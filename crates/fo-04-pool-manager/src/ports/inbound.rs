//! Inbound Ports (Driving Ports / API)

use async_trait::async_trait;
use shared_types::{
    FairOrderingError, OrderingResult, PoolConfig, PoolId, PoolMetrics, TransactionId,
    TransactionRequest,
};

/// The fair-ordering service surface exposed to the transport layer.
#[async_trait]
pub trait FairOrderingApi: Send + Sync {
    /// Create a pool.
    ///
    /// # Errors
    /// `InvalidConfig` for a constraint violation or an id already in use.
    async fn create_pool(&self, config: PoolConfig) -> Result<PoolId, FairOrderingError>;

    /// Install a new config version for an existing pool. Batches already
    /// closing keep the version they closed under.
    ///
    /// # Errors
    /// `InvalidConfig`, `PoolNotFound`.
    async fn replace_pool_config(&self, config: PoolConfig) -> Result<u32, FairOrderingError>;

    /// Stamp, assess and enqueue a transaction. May close the pool's batch
    /// when it reaches `batch_size`.
    ///
    /// # Errors
    /// `PoolNotFound`, `WindowInvalid`, `SlippageExceedsPoolCeiling`. A
    /// rejected submission leaves no state behind.
    async fn submit(
        &self,
        request: TransactionRequest,
        pool_id: &PoolId,
    ) -> Result<TransactionId, FairOrderingError>;

    /// Withdraw a transaction whose batch has not closed.
    ///
    /// # Errors
    /// `AlreadyClosed` once its batch closed or it was already cancelled,
    /// `NotFound` for an id the service never issued.
    async fn cancel(&self, id: &TransactionId) -> Result<bool, FairOrderingError>;

    /// # Errors
    /// `NotFound` while pending, or when unknown or evicted.
    async fn get_result(&self, id: &TransactionId) -> Result<OrderingResult, FairOrderingError>;

    /// # Errors
    /// `PoolNotFound`.
    async fn get_metrics(&self, pool_id: &PoolId) -> Result<PoolMetrics, FairOrderingError>;
}
