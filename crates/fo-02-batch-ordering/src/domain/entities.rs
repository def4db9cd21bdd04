//! Core entities for Batch Ordering

use serde::{Deserialize, Serialize};
use shared_types::{
    BatchId, FairOrderingError, OrderingResult, PendingTransaction, PoolConfig, PoolId,
    Timestamp, TransactionId,
};
use std::fmt;
use std::sync::Arc;

/// Which trigger won the Open -> Closing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    SizeReached,
    TimeoutElapsed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::SizeReached => f.write_str("size_reached"),
            CloseReason::TimeoutElapsed => f.write_str("timeout_elapsed"),
        }
    }
}

/// Snapshot of one ordering round.
///
/// Exists only between the close and the write of its results. `config` is
/// the pool config version that was current when the batch closed.
#[derive(Debug, Clone)]
pub struct Batch {
    pub pool_id: PoolId,
    pub batch_id: BatchId,
    pub config: Arc<PoolConfig>,
    pub transactions: Vec<PendingTransaction>,
    pub close_reason: CloseReason,
    pub closed_at: Timestamp,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Everything a batch close produces.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// One result per transaction that reached a terminal state in this
    /// batch. Successes come first, in position order.
    pub results: Vec<OrderingResult>,
    /// `notYet` transactions to re-enqueue into the next batch.
    pub deferred: Vec<PendingTransaction>,
    /// Set when the whole batch failed atomically.
    pub failure: Option<FairOrderingError>,
}

impl BatchOutcome {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// `(transaction, position)` pairs for the submission collaborator.
    pub fn ordered(&self) -> Vec<(TransactionId, usize)> {
        self.results
            .iter()
            .filter_map(|r| r.final_position.map(|p| (r.transaction_id, p)))
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

/// One slot of an algorithm's output.
///
/// `index` refers to the FIFO-sorted eligible set, so it doubles as the
/// transaction's FIFO position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub index: usize,
    pub fairness_score: f64,
}

impl Placement {
    pub fn new(index: usize, fairness_score: f64) -> Self {
        Self {
            index,
            fairness_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ResultStatus;

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::SizeReached.to_string(), "size_reached");
        assert_eq!(CloseReason::TimeoutElapsed.to_string(), "timeout_elapsed");
    }

    #[test]
    fn test_outcome_ordered_skips_non_success() {
        let pool = PoolId::from("p");
        let a = TransactionId::from_u128(1);
        let b = TransactionId::from_u128(2);
        let outcome = BatchOutcome {
            results: vec![
                OrderingResult::success(a, pool.clone(), 0, 0, 1.0, 10),
                OrderingResult::terminal(
                    b,
                    pool,
                    Some(0),
                    ResultStatus::Expired,
                    shared_types::ErrorCode::WindowExpired,
                    "lapsed",
                    10,
                ),
            ],
            ..Default::default()
        };

        assert_eq!(outcome.ordered(), vec![(a, 0)]);
        assert_eq!(outcome.success_count(), 1);
        assert!(!outcome.is_failed());
    }
}
