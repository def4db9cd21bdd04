//! Notifications published when a batch close completes.

use fo_02_batch_ordering::{BatchOutcome, CloseReason};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, PoolId, ResultStatus, Timestamp, TransactionId};

/// A closed batch, as seen by the submission collaborator.
///
/// Published only after every result of the batch has been stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchClosed {
    pub pool_id: PoolId,
    pub batch_id: BatchId,
    pub close_reason: CloseReason,
    pub closed_at: Timestamp,
    pub config_version: u32,
    /// `(transaction, final position)` in position order.
    pub ordered: Vec<(TransactionId, usize)>,
    pub expired: usize,
    pub deferred: usize,
    /// Of `deferred`, those already deferred by an earlier close.
    pub redeferred: usize,
    /// Whole batch failed with `AlgorithmError`.
    pub failed: bool,
}

impl BatchClosed {
    pub fn from_outcome(
        pool_id: PoolId,
        batch_id: BatchId,
        close_reason: CloseReason,
        closed_at: Timestamp,
        config_version: u32,
        outcome: &BatchOutcome,
    ) -> Self {
        Self {
            pool_id,
            batch_id,
            close_reason,
            closed_at,
            config_version,
            ordered: outcome.ordered(),
            expired: outcome
                .results
                .iter()
                .filter(|r| r.status == ResultStatus::Expired)
                .count(),
            deferred: outcome.deferred.len(),
            redeferred: outcome.deferred.iter().filter(|p| p.deferrals > 0).count(),
            failed: outcome.is_failed(),
        }
    }
}
