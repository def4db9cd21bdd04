//! Domain invariants for Batch Ordering

use super::entities::Placement;

/// Positions within one batch are a permutation of `0..len`.
///
/// Placements are listed in final order, so this checks that every FIFO
/// index appears exactly once.
pub fn invariant_permutation(placements: &[Placement], len: usize) -> bool {
    if placements.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for placement in placements {
        match seen.get_mut(placement.index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// Fairness scores stay inside [0, 1].
pub fn invariant_scores_bounded(placements: &[Placement]) -> bool {
    placements
        .iter()
        .all(|p| (0.0..=1.0).contains(&p.fairness_score))
}

/// `1 - |final - fifo| / len`, clamped to [0, 1].
pub fn displacement_score(final_position: usize, fifo_position: usize, len: usize) -> f64 {
    if len == 0 {
        return 1.0;
    }
    let displacement = final_position.abs_diff(fifo_position) as f64;
    (1.0 - displacement / len as f64).clamp(0.0, 1.0)
}
