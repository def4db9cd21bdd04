//! FIFO: arrival order, the fairness baseline.

use crate::domain::entities::Placement;
use shared_types::PendingTransaction;

/// Sort by `submitted_at` ascending, ties by id.
pub fn sort_fifo(transactions: &mut [PendingTransaction]) {
    transactions.sort_by_key(|p| (p.transaction.submitted_at, p.id()));
}

/// Identity placement with score 1.0 for every slot.
pub fn order(len: usize) -> Vec<Placement> {
    (0..len).map(|i| Placement::new(i, 1.0)).collect()
}
