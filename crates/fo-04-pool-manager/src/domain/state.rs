//! Per-pool batch state word.
//!
//! One `AtomicU64` holds both the Open/Closing flag (bit 0) and the batch
//! sequence number (bits 1..). The Open -> Closing transition is a single
//! compare-and-swap, so whichever trigger wins it owns the close and takes
//! the sequence number as its batch id; a loser sees Closing and backs off.

use serde::{Deserialize, Serialize};
use shared_types::BatchId;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Notify;

const CLOSING: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPhase {
    /// Accepting submissions into batch `sequence`.
    Open,
    /// Batch `sequence` is being ordered; new submissions wait for the next one.
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub sequence: BatchId,
    pub phase: BatchPhase,
}

#[derive(Debug, Default)]
pub struct BatchStateWord(AtomicU64);

impl BatchStateWord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> BatchState {
        let word = self.0.load(Ordering::Acquire);
        BatchState {
            sequence: word >> 1,
            phase: if word & CLOSING == 0 {
                BatchPhase::Open
            } else {
                BatchPhase::Closing
            },
        }
    }

    /// Open -> Closing. Returns the id of the batch now closing, or `None`
    /// if another trigger already holds the close.
    pub fn try_begin_close(&self) -> Option<BatchId> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current & CLOSING != 0 {
                return None;
            }
            match self.0.compare_exchange_weak(
                current,
                current | CLOSING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(current >> 1),
                Err(actual) => current = actual,
            }
        }
    }

    /// Closing(batch_id) -> Open(batch_id + 1). Returns false if the word
    /// was not in that state.
    pub fn finish_close(&self, batch_id: BatchId) -> bool {
        let expected = (batch_id << 1) | CLOSING;
        let next = (batch_id + 1) << 1;
        self.0
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Counts batch ordering tasks that have not finished yet.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    pub fn end(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Resolves once no task is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_state_is_open_zero() {
        let word = BatchStateWord::new();
        assert_eq!(
            word.load(),
            BatchState {
                sequence: 0,
                phase: BatchPhase::Open
            }
        );
    }

    #[test]
    fn test_close_cycle_advances_sequence() {
        let word = BatchStateWord::new();
        assert_eq!(word.try_begin_close(), Some(0));
        assert_eq!(word.load().phase, BatchPhase::Closing);
        assert_eq!(word.try_begin_close(), None);

        assert!(!word.finish_close(5));
        assert!(word.finish_close(0));
        assert_eq!(
            word.load(),
            BatchState {
                sequence: 1,
                phase: BatchPhase::Open
            }
        );
        assert_eq!(word.try_begin_close(), Some(1));
    }

    #[test]
    fn test_exactly_one_thread_wins_the_close() {
        let word = Arc::new(BatchStateWord::new());
        let winners: usize = (0..8)
            .map(|_| {
                let word = word.clone();
                std::thread::spawn(move || word.try_begin_close().is_some() as usize)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_wait_idle() {
        let tracker = Arc::new(InFlightTracker::new());
        tracker.wait_idle().await;

        tracker.begin();
        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        tracker.end();
        waiter.await.unwrap();
        assert_eq!(tracker.count(), 0);
    }
}
