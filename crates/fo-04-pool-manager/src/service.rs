//! Pool Manager Service
//!
//! Owns the pool registry and the batch scheduler. Submissions are assessed
//! and enqueued on the caller's task; a closed batch is ordered and written
//! on a spawned task so the next batch keeps filling meanwhile.

use crate::adapters::publisher::BroadcastPublisher;
use crate::config::ManagerConfig;
use crate::domain::events::BatchClosed;
use crate::domain::pool::{PendingQueue, Pool};
use crate::domain::state::{BatchPhase, BatchState, InFlightTracker};
use crate::ports::inbound::FairOrderingApi;
use crate::ports::outbound::BatchEventPublisher;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fo_01_risk_analysis::{RiskAnalysisApi, RiskAnalyzer};
use fo_02_batch_ordering::{Batch, BatchOrderingApi, BatchOrderingEngine, CloseReason};
use fo_03_result_store::{sweep_task, InMemoryKVStore, ResultStore, ResultStoreApi, StoreError};
use shared_types::{
    BatchId, ErrorCode, FairOrderingError, OrderingResult, PendingTransaction, PoolConfig, PoolId,
    PoolMetrics, ResultStatus, TimeSource, Timestamp, Transaction, TransactionId,
    TransactionRequest,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Entry point of the fair-ordering service.
///
/// Cheap to clone; clones share the same pools and result store.
#[derive(Clone)]
pub struct PoolManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: ManagerConfig,
    clock: Arc<dyn TimeSource>,
    pools: DashMap<PoolId, Arc<Pool>>,
    /// Pending (or closing) transaction -> owning pool.
    index: DashMap<TransactionId, PoolId>,
    analyzer: RiskAnalyzer,
    engine: BatchOrderingEngine,
    store: Arc<dyn ResultStoreApi>,
    publisher: BroadcastPublisher,
    in_flight: InFlightTracker,
    last_stamp: AtomicU64,
}

impl PoolManager {
    /// Manager backed by the in-memory result store.
    pub fn new(config: ManagerConfig, clock: Arc<dyn TimeSource>) -> Self {
        let store = Arc::new(ResultStore::new(
            InMemoryKVStore::new(),
            clock.clone(),
            config.result_store.clone(),
        ));
        Self::with_store(config, clock, store)
    }

    pub fn with_store(
        config: ManagerConfig,
        clock: Arc<dyn TimeSource>,
        store: Arc<dyn ResultStoreApi>,
    ) -> Self {
        let analyzer = RiskAnalyzer::new(config.risk.clone());
        let publisher = BroadcastPublisher::new(config.scheduler.event_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                pools: DashMap::new(),
                index: DashMap::new(),
                analyzer,
                engine: BatchOrderingEngine::new(),
                store,
                publisher,
                in_flight: InFlightTracker::new(),
                last_stamp: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn result_store(&self) -> Arc<dyn ResultStoreApi> {
        self.inner.store.clone()
    }

    /// Pool ids in lexicographic order.
    pub fn list_pools(&self) -> Vec<PoolId> {
        let mut ids: Vec<PoolId> = self.inner.pools.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn pool_config(&self, pool_id: &PoolId) -> Result<Arc<PoolConfig>, FairOrderingError> {
        Ok(self.inner.pool(pool_id)?.config())
    }

    pub fn pending_count(&self, pool_id: &PoolId) -> Result<usize, FairOrderingError> {
        Ok(self.inner.pool(pool_id)?.pending_count())
    }

    pub fn batch_state(&self, pool_id: &PoolId) -> Result<BatchState, FairOrderingError> {
        Ok(self.inner.pool(pool_id)?.batch_state())
    }

    /// Closed-batch notifications, published after the batch's results are stored.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchClosed> {
        self.inner.publisher.subscribe()
    }

    /// Number of batches currently being ordered.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.count()
    }

    /// Resolves once no batch is being ordered.
    pub async fn wait_idle(&self) {
        self.inner.in_flight.wait_idle().await;
    }

    /// Close every Open pool whose current batch has waited `batch_timeout`.
    ///
    /// Must be called from within a Tokio runtime. Returns the number of
    /// batches closed.
    pub fn poll_timeouts(&self) -> usize {
        let inner = &self.inner;
        let now = inner.clock.now();
        let pools: Vec<Arc<Pool>> = inner.pools.iter().map(|e| e.value().clone()).collect();

        let mut closed = 0;
        for pool in pools {
            if pool.batch_state().phase == BatchPhase::Closing {
                continue;
            }
            let timeout_ms = pool.config().batch_timeout_ms();
            let batch = {
                let mut queue = pool.lock_queue();
                if !queue.timeout_due(now, timeout_ms) {
                    continue;
                }
                inner.close_locked(&pool, &mut queue, CloseReason::TimeoutElapsed)
            };
            if let Some(batch) = batch {
                closed += 1;
                inner.dispatch(pool, batch);
            }
        }
        closed
    }

    /// Drive `poll_timeouts` from a `tokio::time::interval`.
    pub fn spawn_timer_task(&self) -> JoinHandle<()> {
        let manager = self.clone();
        let period = self.inner.config.scheduler.tick_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let closed = manager.poll_timeouts();
                if closed > 0 {
                    trace!(closed, "Timer closed batches");
                }
            }
        })
    }

    /// Evict results past the retention window in the background.
    pub fn spawn_sweep_task(&self) -> JoinHandle<()> {
        tokio::spawn(sweep_task(
            self.inner.store.clone(),
            self.inner.clock.clone(),
            self.inner.config.result_store.sweep_interval,
        ))
    }
}

impl Inner {
    fn pool(&self, pool_id: &PoolId) -> Result<Arc<Pool>, FairOrderingError> {
        self.pools
            .get(pool_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| FairOrderingError::PoolNotFound(pool_id.clone()))
    }

    /// Clock reading made non-decreasing across the manager.
    fn stamp(&self) -> Timestamp {
        let now = self.clock.now();
        let previous = self.last_stamp.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }

    /// Take the close if the queue already holds a full batch.
    fn size_trigger_locked(&self, pool: &Pool, queue: &mut PendingQueue) -> Option<Batch> {
        if queue.len() < pool.config().batch_size {
            return None;
        }
        self.close_locked(pool, queue, CloseReason::SizeReached)
    }

    /// Open -> Closing and snapshot, with the queue lock held.
    fn close_locked(
        &self,
        pool: &Pool,
        queue: &mut PendingQueue,
        close_reason: CloseReason,
    ) -> Option<Batch> {
        if queue.is_empty() {
            return None;
        }
        let Some(batch_id) = pool.state().try_begin_close() else {
            debug!(pool_id = %pool.id(), reason = %close_reason, "Batch already closing");
            return None;
        };

        let config = pool.config();
        let transactions = queue.drain_batch(config.batch_size);
        let closed_at = self.stamp();
        debug!(
            pool_id = %pool.id(),
            batch_id,
            reason = %close_reason,
            tx_count = transactions.len(),
            carried_over = queue.len(),
            "Batch closing"
        );

        Some(Batch {
            pool_id: pool.id().clone(),
            batch_id,
            config,
            transactions,
            close_reason,
            closed_at,
        })
    }

    /// Hand a closed batch to its own task.
    fn dispatch(self: &Arc<Self>, pool: Arc<Pool>, batch: Batch) {
        self.in_flight.begin();
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.complete_batch(&pool, batch);
            inner.in_flight.end();
        });
    }

    fn complete_batch(self: &Arc<Self>, pool: &Arc<Pool>, batch: Batch) {
        let pool_id = batch.pool_id.clone();
        let batch_id = batch.batch_id;
        let closed_at = batch.closed_at;
        let close_reason = batch.close_reason;
        let config_version = batch.config.version;

        let outcome = self.engine.order(batch);

        self.persist(&pool_id, batch_id, &outcome.results);
        self.store.update_metrics(&pool_id, &outcome.results, closed_at);
        for result in &outcome.results {
            self.index.remove(&result.transaction_id);
        }

        let event = BatchClosed::from_outcome(
            pool_id.clone(),
            batch_id,
            close_reason,
            closed_at,
            config_version,
            &outcome,
        );
        self.publisher.publish(event);

        // Reopen. Deferred transactions lead the next batch; submissions
        // that arrived while closing may already fill it.
        let next = {
            let mut queue = pool.lock_queue();
            if !outcome.deferred.is_empty() {
                debug!(
                    pool_id = %pool_id,
                    batch_id,
                    deferred = outcome.deferred.len(),
                    max_deferrals = outcome.deferred.iter().map(|p| p.deferrals).max().unwrap_or(0),
                    "Re-enqueueing deferred transactions"
                );
                queue.requeue_deferred(outcome.deferred, self.stamp());
            }
            if !pool.state().finish_close(batch_id) {
                error!(pool_id = %pool_id, batch_id, "Batch state word out of sync on reopen");
            }
            self.size_trigger_locked(pool, &mut queue)
        };

        if let Some(next) = next {
            self.dispatch(pool.clone(), next);
        }
    }

    fn persist(&self, pool_id: &PoolId, batch_id: BatchId, results: &[OrderingResult]) {
        if let Err(e) = self.store.put_batch(results) {
            error!(
                pool_id = %pool_id,
                batch_id,
                error = %e,
                "Batch write failed, storing results one by one"
            );
            for result in results {
                if let Err(e) = self.store.put(result.clone()) {
                    error!(tx_id = %result.transaction_id, error = %e, "Result write failed");
                }
            }
        }
    }
}

#[async_trait]
impl FairOrderingApi for PoolManager {
    async fn create_pool(&self, mut config: PoolConfig) -> Result<PoolId, FairOrderingError> {
        config.validate()?;
        config.version = 1;
        let pool_id = config.pool_id.clone();

        match self.inner.pools.entry(pool_id.clone()) {
            Entry::Occupied(_) => Err(FairOrderingError::InvalidConfig(format!(
                "pool {pool_id} already exists"
            ))),
            Entry::Vacant(slot) => {
                info!(
                    pool_id = %pool_id,
                    algorithm = ?config.ordering_algorithm,
                    batch_size = config.batch_size,
                    batch_timeout_ms = config.batch_timeout_ms(),
                    "Pool created"
                );
                slot.insert(Arc::new(Pool::new(config, self.inner.analyzer.new_window())));
                Ok(pool_id)
            }
        }
    }

    async fn replace_pool_config(&self, config: PoolConfig) -> Result<u32, FairOrderingError> {
        config.validate()?;
        let pool = self.inner.pool(&config.pool_id)?;
        let version = pool.replace_config(config);
        info!(pool_id = %pool.id(), version, "Pool config replaced");

        // A smaller batch_size may already be reached
        let closing = {
            let mut queue = pool.lock_queue();
            self.inner.size_trigger_locked(&pool, &mut queue)
        };
        if let Some(batch) = closing {
            self.inner.dispatch(pool, batch);
        }
        Ok(version)
    }

    async fn submit(
        &self,
        request: TransactionRequest,
        pool_id: &PoolId,
    ) -> Result<TransactionId, FairOrderingError> {
        let inner = &self.inner;
        let pool = inner.pool(pool_id)?;

        if request.has_inverted_window() {
            let after = request.execute_after.unwrap_or_default();
            let before = request.execute_before.unwrap_or_default();
            warn!(pool_id = %pool_id, after, before, "Rejected submission: inverted window");
            return Err(FairOrderingError::WindowInvalid { after, before });
        }

        let ceiling = pool.config().max_slippage;
        if request.max_slippage > ceiling {
            warn!(
                pool_id = %pool_id,
                requested = request.max_slippage,
                ceiling,
                "Rejected submission: slippage above pool ceiling"
            );
            return Err(FairOrderingError::SlippageExceedsPoolCeiling {
                requested: request.max_slippage,
                ceiling,
            });
        }

        let id = TransactionId::new();
        let closing = {
            let mut queue = pool.lock_queue();
            let tx = Transaction::from_request(id, request, inner.stamp());
            let risk = inner.analyzer.assess(&tx, queue.recent());
            debug!(
                tx_id = %id,
                pool_id = %pool_id,
                risk_level = ?risk.risk_level,
                "Transaction enqueued"
            );
            inner.index.insert(id, pool_id.clone());
            queue.push(PendingTransaction::new(tx, risk));
            inner.size_trigger_locked(&pool, &mut queue)
        };

        if let Some(batch) = closing {
            inner.dispatch(pool, batch);
        }
        Ok(id)
    }

    async fn cancel(&self, id: &TransactionId) -> Result<bool, FairOrderingError> {
        let inner = &self.inner;
        let Some(pool_id) = inner.index.get(id).map(|e| e.value().clone()) else {
            return if inner.store.contains(id) {
                Err(FairOrderingError::AlreadyClosed(*id))
            } else {
                Err(FairOrderingError::NotFound(*id))
            };
        };

        let pool = inner.pool(&pool_id)?;
        let removed = pool.lock_queue().remove(id);
        if removed.is_none() {
            debug!(tx_id = %id, pool_id = %pool_id, "Cancel lost to batch close");
            return Err(FairOrderingError::AlreadyClosed(*id));
        }

        let result = OrderingResult::terminal(
            *id,
            pool_id.clone(),
            None,
            ResultStatus::Cancelled,
            ErrorCode::Cancelled,
            "cancelled before batch close",
            inner.stamp(),
        );
        if let Err(e) = inner.store.put(result) {
            error!(tx_id = %id, error = %e, "Failed to store cancellation");
        }
        inner.store.record_cancellation(&pool_id);
        inner.index.remove(id);

        info!(tx_id = %id, pool_id = %pool_id, "Transaction cancelled");
        Ok(true)
    }

    async fn get_result(&self, id: &TransactionId) -> Result<OrderingResult, FairOrderingError> {
        match self.inner.store.get(id) {
            Ok(result) => Ok(result),
            Err(StoreError::NotFound(id)) => Err(FairOrderingError::NotFound(id)),
            Err(e) => {
                error!(tx_id = %id, error = %e, "Result lookup failed");
                Err(FairOrderingError::NotFound(*id))
            }
        }
    }

    async fn get_metrics(&self, pool_id: &PoolId) -> Result<PoolMetrics, FairOrderingError> {
        self.inner.pool(pool_id)?;
        Ok(self.inner.store.metrics(pool_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ManualTimeSource, OrderingAlgorithm};
    use std::time::Duration;

    fn manager(clock: Arc<ManualTimeSource>) -> PoolManager {
        PoolManager::new(ManagerConfig::default(), clock)
    }

    fn request(from: &str) -> TransactionRequest {
        TransactionRequest::new(from, "0xb0b", 10)
    }

    #[tokio::test]
    async fn test_create_pool_validates_and_rejects_duplicates() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        let config = PoolConfig::new("p", OrderingAlgorithm::Fifo);

        assert_eq!(manager.create_pool(config.clone()).await.unwrap(), PoolId::from("p"));
        assert_eq!(manager.pool_config(&PoolId::from("p")).unwrap().version, 1);
        assert!(matches!(
            manager.create_pool(config.clone()).await,
            Err(FairOrderingError::InvalidConfig(_))
        ));
        assert!(matches!(
            manager.create_pool(config.with_batch_size(0)).await,
            Err(FairOrderingError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_validation_leaves_no_state() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        let pool = manager
            .create_pool(PoolConfig::new("p", OrderingAlgorithm::Fifo).with_max_slippage(0.01))
            .await
            .unwrap();

        let missing = manager.submit(request("0x1"), &PoolId::from("nope")).await;
        assert_eq!(missing, Err(FairOrderingError::PoolNotFound(PoolId::from("nope"))));

        let inverted = request("0x1").with_window(Some(10), Some(10));
        assert_eq!(
            manager.submit(inverted, &pool).await,
            Err(FairOrderingError::WindowInvalid { after: 10, before: 10 })
        );

        let greedy = request("0x1").with_slippage(0.5);
        assert!(matches!(
            manager.submit(greedy, &pool).await,
            Err(FairOrderingError::SlippageExceedsPoolCeiling { .. })
        ));

        assert_eq!(manager.pending_count(&pool).unwrap(), 0);
        assert!(manager.inner.index.is_empty());
    }

    #[tokio::test]
    async fn test_stamp_is_monotonic() {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let manager = manager(clock.clone());

        assert_eq!(manager.inner.stamp(), 1_000);
        clock.set(500);
        assert_eq!(manager.inner.stamp(), 1_000);
        clock.set(1_200);
        assert_eq!(manager.inner.stamp(), 1_200);
    }

    #[tokio::test]
    async fn test_replace_config_with_smaller_batch_closes() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        let pool = manager
            .create_pool(PoolConfig::new("p", OrderingAlgorithm::Fifo).with_batch_size(10))
            .await
            .unwrap();
        for from in ["0x1", "0x2", "0x3"] {
            manager.submit(request(from), &pool).await.unwrap();
        }

        let version = manager
            .replace_pool_config(PoolConfig::new("p", OrderingAlgorithm::Fifo).with_batch_size(2))
            .await
            .unwrap();
        assert_eq!(version, 2);
        manager.wait_idle().await;

        // 2 ordered, 1 left pending for the next batch
        assert_eq!(manager.pending_count(&pool).unwrap(), 1);
        assert_eq!(manager.batch_state(&pool).unwrap().sequence, 1);
        assert_eq!(manager.get_metrics(&pool).await.unwrap().total_processed, 2);
    }

    #[tokio::test]
    async fn test_replace_config_unknown_pool() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        let result = manager
            .replace_pool_config(PoolConfig::new("ghost", OrderingAlgorithm::Fifo))
            .await;
        assert_eq!(result, Err(FairOrderingError::PoolNotFound(PoolId::from("ghost"))));
    }

    #[tokio::test]
    async fn test_get_metrics_unknown_pool() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        assert!(matches!(
            manager.get_metrics(&PoolId::from("x")).await,
            Err(FairOrderingError::PoolNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_pools_sorted() {
        let manager = manager(Arc::new(ManualTimeSource::new(0)));
        for id in ["zeta", "alpha", "mid"] {
            manager
                .create_pool(PoolConfig::new(id, OrderingAlgorithm::Fifo))
                .await
                .unwrap();
        }
        let ids: Vec<_> = manager.list_pools().into_iter().map(|p| p.0).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_task_drives_timeouts() {
        let clock = Arc::new(ManualTimeSource::new(0));
        let manager = manager(clock.clone());
        let pool = manager
            .create_pool(
                PoolConfig::new("p", OrderingAlgorithm::Fifo)
                    .with_batch_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap();
        let id = manager.submit(request("0x1"), &pool).await.unwrap();

        let timer = manager.spawn_timer_task();
        clock.advance(100);
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.wait_idle().await;
        timer.abort();

        let result = manager.get_result(&id).await.unwrap();
        assert_eq!(result.final_position, Some(0));
    }
}
