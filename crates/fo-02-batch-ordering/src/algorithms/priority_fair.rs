//! PriorityFair: fees reorder only inside a fairness epoch.
//!
//! Epochs are fixed-width slices of `submitted_at` measured from the
//! earliest transaction in the batch. Because epochs are monotone in arrival
//! time, a transaction can only move within its own epoch's block of FIFO
//! positions.

use crate::domain::entities::Placement;
use crate::domain::invariants::displacement_score;
use shared_types::PendingTransaction;
use std::cmp::Reverse;

pub fn epoch_of(submitted_at: u64, base: u64, epoch_width_ms: u64) -> u64 {
    submitted_at.saturating_sub(base) / epoch_width_ms.max(1)
}

pub fn order(eligible: &[PendingTransaction], epoch_width_ms: u64) -> Vec<Placement> {
    let len = eligible.len();
    let base = eligible
        .iter()
        .map(|p| p.transaction.submitted_at)
        .min()
        .unwrap_or(0);

    let mut indices: Vec<usize> = (0..len).collect();
    indices.sort_by_key(|&i| {
        let tx = &eligible[i].transaction;
        (
            epoch_of(tx.submitted_at, base, epoch_width_ms),
            Reverse(tx.gas_price),
            tx.id,
        )
    });

    indices
        .into_iter()
        .enumerate()
        .map(|(position, index)| Placement::new(index, displacement_score(position, index, len)))
        .collect()
}
