//! A fairness pool: config versions, the batch state word and the pending
//! queue.
//!
//! The queue mutex guards the pending entries, the timer anchor and the
//! pool's recent-submission window together. A close drains the queue under
//! that mutex right after winning the state-word CAS, so a cancel either
//! removes its transaction before the snapshot or finds it gone.

use super::state::{BatchState, BatchStateWord};
use fo_01_risk_analysis::RecentWindow;
use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::{PendingTransaction, PoolConfig, PoolId, Timestamp, TransactionId};
use std::collections::VecDeque;
use std::sync::Arc;

pub struct Pool {
    id: PoolId,
    config: RwLock<Arc<PoolConfig>>,
    state: BatchStateWord,
    queue: Mutex<PendingQueue>,
}

impl Pool {
    pub fn new(config: PoolConfig, window: RecentWindow) -> Self {
        Self {
            id: config.pool_id.clone(),
            config: RwLock::new(Arc::new(config)),
            state: BatchStateWord::new(),
            queue: Mutex::new(PendingQueue::new(window)),
        }
    }

    pub fn id(&self) -> &PoolId {
        &self.id
    }

    /// Current config version.
    pub fn config(&self) -> Arc<PoolConfig> {
        self.config.read().clone()
    }

    /// Install `config` as the next version. Returns the new version number.
    pub fn replace_config(&self, mut config: PoolConfig) -> u32 {
        let mut current = self.config.write();
        config.version = current.version + 1;
        let version = config.version;
        *current = Arc::new(config);
        version
    }

    pub fn state(&self) -> &BatchStateWord {
        &self.state
    }

    pub fn batch_state(&self) -> BatchState {
        self.state.load()
    }

    pub fn lock_queue(&self) -> MutexGuard<'_, PendingQueue> {
        self.queue.lock()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.lock().len()
    }
}

pub struct PendingQueue {
    entries: VecDeque<PendingTransaction>,
    /// When the current batch's timer started; `None` while the queue is empty.
    batch_opened_at: Option<Timestamp>,
    recent: RecentWindow,
}

impl PendingQueue {
    pub fn new(recent: RecentWindow) -> Self {
        Self {
            entries: VecDeque::new(),
            batch_opened_at: None,
            recent,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn batch_opened_at(&self) -> Option<Timestamp> {
        self.batch_opened_at
    }

    pub fn recent(&self) -> &RecentWindow {
        &self.recent
    }

    /// Append a new submission, arming the timer if it is the first.
    pub fn push(&mut self, pending: PendingTransaction) {
        self.recent.record(&pending.transaction);
        if self.entries.is_empty() {
            self.batch_opened_at = Some(pending.enqueued_at);
        }
        self.entries.push_back(pending);
    }

    pub fn remove(&mut self, id: &TransactionId) -> Option<PendingTransaction> {
        let index = self.entries.iter().position(|p| p.id() == *id)?;
        let removed = self.entries.remove(index);
        if self.entries.is_empty() {
            self.batch_opened_at = None;
        }
        removed
    }

    /// Take the oldest `max` entries as the closing batch. The remainder
    /// becomes the next batch with its timer at its earliest entry.
    pub fn drain_batch(&mut self, max: usize) -> Vec<PendingTransaction> {
        let take = self.entries.len().min(max);
        let batch: Vec<_> = self.entries.drain(..take).collect();
        self.batch_opened_at = self.entries.iter().map(|p| p.enqueued_at).min();
        batch
    }

    /// Put deferred transactions at the front of the next batch.
    pub fn requeue_deferred(&mut self, deferred: Vec<PendingTransaction>, at: Timestamp) {
        if deferred.is_empty() {
            return;
        }
        for mut pending in deferred.into_iter().rev() {
            pending.enqueued_at = at;
            pending.deferrals += 1;
            self.entries.push_front(pending);
        }
        self.batch_opened_at = Some(self.batch_opened_at.map_or(at, |t| t.min(at)));
    }

    /// True when a non-empty batch has waited at least `timeout_ms`.
    pub fn timeout_due(&self, now: Timestamp, timeout_ms: u64) -> bool {
        self.batch_opened_at
            .is_some_and(|opened| now.saturating_sub(opened) >= timeout_ms)
    }
}
