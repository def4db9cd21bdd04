//! Batch Ordering Service
//!
//! Main service implementing BatchOrderingApi.

use crate::algorithms::fifo::sort_fifo;
use crate::algorithms::{partition, OrderingContext, Partition, Strategy};
use crate::domain::entities::{Batch, BatchOutcome, Placement};
use crate::domain::errors::OrderingError;
use crate::domain::invariants::{invariant_permutation, invariant_scores_bounded};
use crate::ports::inbound::BatchOrderingApi;
use shared_types::{
    BatchId, ErrorCode, OrderingResult, PoolId, ResultStatus, Timestamp, TransactionId,
};
use tracing::{debug, error, info, warn};

/// Batch Ordering Engine
///
/// Pipeline per batch:
/// 1. Resolve the algorithm and its parameters
/// 2. Partition by validity and execution window
/// 3. Sort the eligible set into FIFO order
/// 4. Run the algorithm and check the placement invariants
/// 5. Emit one result per terminal transaction
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOrderingEngine;

impl BatchOrderingEngine {
    pub fn new() -> Self {
        Self
    }

    fn fail_batch(
        pool_id: &PoolId,
        batch_id: BatchId,
        ids: Vec<TransactionId>,
        err: OrderingError,
        closed_at: Timestamp,
    ) -> BatchOutcome {
        warn!(
            pool_id = %pool_id,
            batch_id,
            tx_count = ids.len(),
            error = %err,
            "Batch failed, every transaction marked Failed"
        );

        let message = err.to_string();
        let results = ids
            .into_iter()
            .map(|id| {
                OrderingResult::terminal(
                    id,
                    pool_id.clone(),
                    Some(batch_id),
                    ResultStatus::Failed,
                    ErrorCode::AlgorithmError,
                    message.clone(),
                    closed_at,
                )
            })
            .collect();

        BatchOutcome {
            results,
            deferred: Vec::new(),
            failure: Some(err.into()),
        }
    }
}

fn partition_ids(partition: &Partition) -> Vec<TransactionId> {
    partition
        .eligible
        .iter()
        .chain(partition.expired.iter())
        .chain(partition.not_yet.iter())
        .map(|p| p.id())
        .chain(partition.malformed.iter().map(|(p, _)| p.id()))
        .collect()
}

impl BatchOrderingApi for BatchOrderingEngine {
    fn order(&self, batch: Batch) -> BatchOutcome {
        let Batch {
            pool_id,
            batch_id,
            config,
            transactions,
            close_reason,
            closed_at,
        } = batch;

        // 1. Resolve algorithm
        let strategy = match Strategy::from_config(&config) {
            Ok(strategy) => strategy,
            Err(err) => {
                let ids = transactions.iter().map(|p| p.id()).collect();
                return Self::fail_batch(&pool_id, batch_id, ids, err, closed_at);
            }
        };

        // 2. Partition
        let mut parts = partition(transactions, closed_at);

        // 3. FIFO baseline
        sort_fifo(&mut parts.eligible);

        // 4. Order
        let ctx = OrderingContext {
            pool_id: &pool_id,
            batch_id,
            closed_at,
        };
        let placements = strategy.order(&parts.eligible, ctx);
        let len = parts.eligible.len();
        if !invariant_permutation(&placements, len) || !invariant_scores_bounded(&placements) {
            error!(
                pool_id = %pool_id,
                batch_id,
                algorithm = strategy.name(),
                "Ordering produced an invalid placement"
            );
            let ids = partition_ids(&parts);
            return Self::fail_batch(
                &pool_id,
                batch_id,
                ids,
                OrderingError::BrokenPermutation { len },
                closed_at,
            );
        }

        // 5. Results
        let mut results = Vec::with_capacity(len + parts.expired.len() + parts.malformed.len());
        for (position, Placement { index, fairness_score }) in placements.into_iter().enumerate() {
            results.push(OrderingResult::success(
                parts.eligible[index].id(),
                pool_id.clone(),
                batch_id,
                position,
                fairness_score,
                closed_at,
            ));
        }
        for pending in &parts.expired {
            results.push(OrderingResult::terminal(
                pending.id(),
                pool_id.clone(),
                Some(batch_id),
                ResultStatus::Expired,
                ErrorCode::WindowExpired,
                format!(
                    "execute_before {} passed before batch closed at {}",
                    pending.transaction.execute_before.unwrap_or_default(),
                    closed_at
                ),
                closed_at,
            ));
        }
        for (pending, reason) in &parts.malformed {
            debug!(tx_id = %pending.id(), reason = %reason, "Excluding malformed transaction");
            results.push(OrderingResult::terminal(
                pending.id(),
                pool_id.clone(),
                Some(batch_id),
                ResultStatus::Failed,
                ErrorCode::MalformedTransaction,
                reason.clone(),
                closed_at,
            ));
        }

        if !parts.not_yet.is_empty() {
            debug!(
                pool_id = %pool_id,
                batch_id,
                deferred = parts.not_yet.len(),
                "Deferring transactions whose window has not opened"
            );
        }

        info!(
            pool_id = %pool_id,
            batch_id,
            algorithm = strategy.name(),
            close_reason = %close_reason,
            ordered = len,
            expired = parts.expired.len(),
            malformed = parts.malformed.len(),
            deferred = parts.not_yet.len(),
            "Batch ordered"
        );

        BatchOutcome {
            results,
            deferred: parts.not_yet,
            failure: None,
        }
    }
}
