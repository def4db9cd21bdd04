//! TimeWeighted: waiting amplifies a transaction's (capped) fee.
//!
//! The fee advantage over the batch median is capped at `cap`, and
//! `decay(wait)` grows linearly from 1 to `cap` over one batch timeout.

use crate::domain::entities::Placement;
use crate::domain::invariants::displacement_score;
use primitive_types::U256;
use shared_types::{u256_to_f64, PendingTransaction, Timestamp};

/// Lower median of the batch's gas prices.
pub fn median_gas_price(eligible: &[PendingTransaction]) -> U256 {
    let mut prices: Vec<U256> = eligible.iter().map(|p| p.transaction.gas_price).collect();
    if prices.is_empty() {
        return U256::zero();
    }
    prices.sort_unstable();
    prices[(prices.len() - 1) / 2]
}

pub fn decay(wait_ms: u64, timeout_ms: u64, cap: f64) -> f64 {
    let progress = (wait_ms as f64 / timeout_ms.max(1) as f64).min(1.0);
    1.0 + (cap - 1.0) * progress
}

pub fn priority_key(
    pending: &PendingTransaction,
    fee_ceiling: f64,
    cap: f64,
    timeout_ms: u64,
    now: Timestamp,
) -> f64 {
    let tx = &pending.transaction;
    let effective_fee = u256_to_f64(tx.gas_price).min(fee_ceiling);
    effective_fee * decay(now.saturating_sub(tx.submitted_at), timeout_ms, cap)
}

pub fn order(
    eligible: &[PendingTransaction],
    cap: f64,
    timeout_ms: u64,
    now: Timestamp,
) -> Vec<Placement> {
    let len = eligible.len();
    let fee_ceiling = u256_to_f64(median_gas_price(eligible)) * cap;
    let keys: Vec<f64> = eligible
        .iter()
        .map(|p| priority_key(p, fee_ceiling, cap, timeout_ms, now))
        .collect();

    let mut indices: Vec<usize> = (0..len).collect();
    indices.sort_by(|&a, &b| {
        keys[b]
            .total_cmp(&keys[a])
            .then_with(|| eligible[a].id().cmp(&eligible[b].id()))
    });

    indices
        .into_iter()
        .enumerate()
        .map(|(position, index)| Placement::new(index, displacement_score(position, index, len)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{RiskAssessment, Transaction, TransactionId, TransactionRequest};

    fn pending(id: u128, at: u64, gas: u64) -> PendingTransaction {
        let tx = Transaction::from_request(
            TransactionId::from_u128(id),
            TransactionRequest::new("0x1", "0x2", gas),
            at,
        );
        PendingTransaction::new(tx, RiskAssessment::clean())
    }

    #[test]
    fn test_decay_is_monotone_and_capped() {
        assert_eq!(decay(0, 1_000, 3.0), 1.0);
        assert_eq!(decay(500, 1_000, 3.0), 2.0);
        assert_eq!(decay(1_000, 1_000, 3.0), 3.0);
        assert_eq!(decay(5_000, 1_000, 3.0), 3.0);
    }

    #[test]
    fn test_fee_advantage_is_capped_at_median_multiple() {
        // Median 10, cap 3: a 1000 fee counts as 30
        let eligible = vec![pending(1, 1_000, 10), pending(2, 1_000, 10), pending(3, 1_000, 1_000)];
        let ceiling = u256_to_f64(median_gas_price(&eligible)) * 3.0;
        assert_eq!(ceiling, 30.0);
        assert_eq!(priority_key(&eligible[2], ceiling, 3.0, 1_000, 1_000), 30.0);
    }

    #[test]
    fn test_older_transaction_beats_capped_newcomer() {
        // Old: fee 10 waited a full timeout -> 10 * 3 = 30
        // New: fee 1000 capped to 30, no wait -> 30; tie broken by id
        // Mid: fee 10 waited half -> 20
        let eligible = vec![pending(1, 0, 10), pending(3, 500, 10), pending(2, 1_000, 1_000)];
        let placements = order(&eligible, 3.0, 1_000, 1_000);
        let indices: Vec<_> = placements.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2, 1]);
    }

    #[test]
    fn test_cap_of_one_is_fee_bounded_fifo() {
        let eligible = vec![pending(1, 0, 10), pending(2, 10, 10), pending(3, 20, 500)];
        let placements = order(&eligible, 1.0, 1_000, 20);
        // All keys equal to the median: ties resolved by id
        let indices: Vec<_> = placements.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(placements.iter().all(|p| p.fairness_score == 1.0));
    }
}
