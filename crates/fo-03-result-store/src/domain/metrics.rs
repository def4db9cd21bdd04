//! Incremental per-pool metrics.
//!
//! Updates are O(1) in the history length: the fairness mean folds in a
//! whole batch with `mean' = mean + (sum - k * mean) / (count + k)`, taken
//! over `Success` results only.

use shared_types::{OrderingResult, PoolMetrics, ResultStatus, Timestamp};

/// Fold one closed batch into `metrics`.
pub fn apply_batch(metrics: &mut PoolMetrics, results: &[OrderingResult], closed_at: Timestamp) {
    let mut score_sum = 0.0;
    let mut scored = 0u64;
    for result in results {
        match result.status {
            ResultStatus::Success => {
                score_sum += result.fairness_score;
                scored += 1;
            }
            ResultStatus::Failed => metrics.total_failed += 1,
            ResultStatus::Expired => metrics.total_expired += 1,
            ResultStatus::Cancelled => metrics.total_cancelled += 1,
        }
    }

    if scored > 0 {
        let old_mean = metrics.fairness_score;
        let total = metrics.scored_count + scored;
        metrics.fairness_score = old_mean + (score_sum - scored as f64 * old_mean) / total as f64;
        metrics.scored_count = total;
    }

    metrics.total_processed += results.len() as u64;
    metrics.batches_closed += 1;
    metrics.last_batch_closed_at = Some(
        metrics
            .last_batch_closed_at
            .map_or(closed_at, |last| last.max(closed_at)),
    );
}

pub fn apply_cancellation(metrics: &mut PoolMetrics) {
    metrics.total_cancelled += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{ErrorCode, PoolId, TransactionId};

    fn success(n: u128, score: f64) -> OrderingResult {
        OrderingResult::success(TransactionId::from_u128(n), PoolId::from("p"), 0, 0, score, 10)
    }

    fn terminal(n: u128, status: ResultStatus) -> OrderingResult {
        OrderingResult::terminal(
            TransactionId::from_u128(n),
            PoolId::from("p"),
            Some(0),
            status,
            ErrorCode::AlgorithmError,
            "x",
            10,
        )
    }

    #[test]
    fn test_counts_by_status() {
        let mut metrics = PoolMetrics::new(PoolId::from("p"));
        apply_batch(
            &mut metrics,
            &[
                success(1, 1.0),
                terminal(2, ResultStatus::Failed),
                terminal(3, ResultStatus::Expired),
            ],
            50,
        );

        assert_eq!(metrics.total_processed, 3);
        assert_eq!(metrics.total_failed, 1);
        assert_eq!(metrics.total_expired, 1);
        assert_eq!(metrics.batches_closed, 1);
        assert_eq!(metrics.scored_count, 1);
        assert_eq!(metrics.fairness_score, 1.0);
        assert_eq!(metrics.last_batch_closed_at, Some(50));
    }

    #[test]
    fn test_failed_batch_leaves_mean_untouched() {
        let mut metrics = PoolMetrics::new(PoolId::from("p"));
        apply_batch(&mut metrics, &[success(1, 0.5)], 10);
        apply_batch(&mut metrics, &[terminal(2, ResultStatus::Failed)], 20);
        assert_eq!(metrics.fairness_score, 0.5);
        assert_eq!(metrics.scored_count, 1);
    }

    #[test]
    fn test_cancellation_counter() {
        let mut metrics = PoolMetrics::new(PoolId::from("p"));
        apply_cancellation(&mut metrics);
        assert_eq!(metrics.total_cancelled, 1);
        assert_eq!(metrics.total_processed, 0);
    }

    proptest! {
        #[test]
        fn prop_incremental_mean_matches_full_mean(
            batches in proptest::collection::vec(
                proptest::collection::vec(0.0f64..=1.0, 0..10),
                1..10,
            ),
        ) {
            let mut metrics = PoolMetrics::new(PoolId::from("p"));
            let mut all = Vec::new();
            for (b, scores) in batches.iter().enumerate() {
                let results: Vec<_> = scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| success((b * 100 + i) as u128, *s))
                    .collect();
                apply_batch(&mut metrics, &results, b as u64);
                all.extend(scores.iter().copied());
            }

            let expected = if all.is_empty() { 0.0 } else { all.iter().sum::<f64>() / all.len() as f64 };
            prop_assert!((metrics.fairness_score - expected).abs() < 1e-9);
            prop_assert_eq!(metrics.scored_count, all.len() as u64);
        }
    }
}
