//! Result Store Service
//!
//! Results are written once per transaction at batch close (or cancel) and
//! read by point lookup. Metrics live beside the key-value store, one entry
//! per pool, updated under that entry's lock.

use crate::config::ResultStoreConfig;
use crate::domain::errors::StoreError;
use crate::domain::metrics::{apply_batch, apply_cancellation};
use crate::domain::record::{result_key, StoredResult, RESULT_PREFIX};
use crate::ports::inbound::ResultStoreApi;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use dashmap::DashMap;
use shared_types::{OrderingResult, PoolId, PoolMetrics, TimeSource, Timestamp, TransactionId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct ResultStore<S: KeyValueStore> {
    kv: S,
    clock: Arc<dyn TimeSource>,
    metrics: DashMap<PoolId, PoolMetrics>,
    config: ResultStoreConfig,
}

impl<S: KeyValueStore> ResultStore<S> {
    pub fn new(kv: S, clock: Arc<dyn TimeSource>, config: ResultStoreConfig) -> Self {
        Self {
            kv,
            clock,
            metrics: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResultStoreConfig {
        &self.config
    }

    fn encode(&self, result: &OrderingResult) -> Result<Vec<u8>, StoreError> {
        let record = StoredResult {
            result: result.clone(),
            stored_at: self.clock.now(),
        };
        bincode::serialize(&record).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<StoredResult, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn ensure_absent(&self, id: &TransactionId) -> Result<(), StoreError> {
        if self.kv.exists(&result_key(id))? {
            error!(tx_id = %id, "Refusing to overwrite an existing result");
            return Err(StoreError::Duplicate(*id));
        }
        Ok(())
    }
}

impl<S: KeyValueStore> ResultStoreApi for ResultStore<S> {
    fn put(&self, result: OrderingResult) -> Result<(), StoreError> {
        self.ensure_absent(&result.transaction_id)?;
        let bytes = self.encode(&result)?;
        self.kv.put(&result_key(&result.transaction_id), &bytes)?;
        Ok(())
    }

    fn put_batch(&self, results: &[OrderingResult]) -> Result<(), StoreError> {
        let mut operations = Vec::with_capacity(results.len());
        for result in results {
            self.ensure_absent(&result.transaction_id)?;
            operations.push(BatchOperation::put(
                result_key(&result.transaction_id),
                self.encode(result)?,
            ));
        }
        self.kv.atomic_batch_write(operations)?;
        Ok(())
    }

    fn get(&self, id: &TransactionId) -> Result<OrderingResult, StoreError> {
        match self.kv.get(&result_key(id))? {
            Some(bytes) => Ok(Self::decode(&bytes)?.result),
            None => Err(StoreError::NotFound(*id)),
        }
    }

    fn contains(&self, id: &TransactionId) -> bool {
        self.kv.exists(&result_key(id)).unwrap_or_else(|e| {
            warn!(tx_id = %id, error = %e, "Existence check failed");
            false
        })
    }

    fn update_metrics(&self, pool_id: &PoolId, results: &[OrderingResult], closed_at: Timestamp) {
        let mut entry = self
            .metrics
            .entry(pool_id.clone())
            .or_insert_with(|| PoolMetrics::new(pool_id.clone()));
        apply_batch(entry.value_mut(), results, closed_at);
    }

    fn record_cancellation(&self, pool_id: &PoolId) {
        let mut entry = self
            .metrics
            .entry(pool_id.clone())
            .or_insert_with(|| PoolMetrics::new(pool_id.clone()));
        apply_cancellation(entry.value_mut());
    }

    fn metrics(&self, pool_id: &PoolId) -> PoolMetrics {
        self.metrics
            .get(pool_id)
            .map(|m| m.value().clone())
            .unwrap_or_else(|| PoolMetrics::new(pool_id.clone()))
    }

    fn evict_expired(&self, now: Timestamp) -> Result<usize, StoreError> {
        let retention_ms = self.config.retention_ms();
        let mut expired = Vec::new();
        for (key, bytes) in self.kv.prefix_scan(RESULT_PREFIX)? {
            match Self::decode(&bytes) {
                Ok(record) if record.is_expired(now, retention_ms) => expired.push(key),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable result record");
                    expired.push(key);
                }
            }
        }

        let evicted = expired.len();
        if evicted > 0 {
            self.kv.atomic_batch_write(
                expired.into_iter().map(BatchOperation::delete).collect(),
            )?;
        }
        Ok(evicted)
    }
}

/// Background task evicting results past the retention window.
pub async fn sweep_task<R>(store: Arc<R>, clock: Arc<dyn TimeSource>, interval: Duration)
where
    R: ResultStoreApi + ?Sized,
{
    let mut sweep_interval = tokio::time::interval(interval);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        sweep_interval.tick().await;
        match store.evict_expired(clock.now()) {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Evicted expired ordering results"),
            Err(e) => warn!(error = %e, "Result sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKVStore;
    use shared_types::{ErrorCode, ManualTimeSource, ResultStatus};

    fn store(clock: Arc<ManualTimeSource>, retention: Duration) -> ResultStore<InMemoryKVStore> {
        let config = ResultStoreConfig {
            retention,
            ..ResultStoreConfig::default()
        };
        ResultStore::new(InMemoryKVStore::new(), clock, config)
    }

    fn success(n: u128, score: f64) -> OrderingResult {
        OrderingResult::success(TransactionId::from_u128(n), PoolId::from("p"), 1, 0, score, 10)
    }

    #[test]
    fn test_put_then_get() {
        let store = store(Arc::new(ManualTimeSource::new(0)), Duration::from_secs(60));
        let result = success(1, 0.9);
        store.put(result.clone()).unwrap();

        assert_eq!(store.get(&result.transaction_id).unwrap(), result);
        assert!(store.contains(&result.transaction_id));
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let store = store(Arc::new(ManualTimeSource::new(0)), Duration::from_secs(60));
        let id = TransactionId::from_u128(42);
        assert_eq!(store.get(&id), Err(StoreError::NotFound(id)));
    }

    #[test]
    fn test_results_are_write_once() {
        let store = store(Arc::new(ManualTimeSource::new(0)), Duration::from_secs(60));
        store.put(success(1, 1.0)).unwrap();

        let cancelled = OrderingResult::terminal(
            TransactionId::from_u128(1),
            PoolId::from("p"),
            None,
            ResultStatus::Cancelled,
            ErrorCode::Cancelled,
            "cancelled",
            20,
        );
        assert!(matches!(store.put(cancelled), Err(StoreError::Duplicate(_))));
        assert!(matches!(
            store.put_batch(&[success(2, 1.0), success(1, 1.0)]),
            Err(StoreError::Duplicate(_))
        ));
        // Nothing from the rejected batch was written
        assert!(!store.contains(&TransactionId::from_u128(2)));
        assert!(store.get(&TransactionId::from_u128(1)).unwrap().is_success());
    }

    #[test]
    fn test_metrics_default_and_update() {
        let store = store(Arc::new(ManualTimeSource::new(0)), Duration::from_secs(60));
        let pool = PoolId::from("p");
        assert_eq!(store.metrics(&pool), PoolMetrics::new(pool.clone()));

        store.update_metrics(&pool, &[success(1, 1.0), success(2, 0.5)], 10);
        store.record_cancellation(&pool);

        let metrics = store.metrics(&pool);
        assert_eq!(metrics.total_processed, 2);
        assert_eq!(metrics.total_cancelled, 1);
        assert!((metrics.fairness_score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_evict_expired_respects_retention() {
        let clock = Arc::new(ManualTimeSource::new(1_000));
        let store = store(clock.clone(), Duration::from_millis(500));

        store.put(success(1, 1.0)).unwrap();
        clock.advance(400);
        store.put(success(2, 1.0)).unwrap();
        clock.advance(200);

        assert_eq!(store.evict_expired(clock.now()).unwrap(), 1);
        assert_eq!(
            store.get(&TransactionId::from_u128(1)),
            Err(StoreError::NotFound(TransactionId::from_u128(1)))
        );
        assert!(store.get(&TransactionId::from_u128(2)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_evicts_in_background() {
        let clock = Arc::new(ManualTimeSource::new(0));
        let store = Arc::new(store(clock.clone(), Duration::from_millis(100)));
        store.put(success(1, 1.0)).unwrap();
        clock.advance(1_000);

        let handle = tokio::spawn(sweep_task(
            store.clone(),
            clock.clone(),
            Duration::from_millis(10),
        ));
        tokio::time::sleep(Duration::from_millis(25)).await;
        handle.abort();

        assert!(!store.contains(&TransactionId::from_u128(1)));
    }
}
