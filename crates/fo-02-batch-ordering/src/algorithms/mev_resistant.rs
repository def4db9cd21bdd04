//! MevResistant: randomize order inside groups of conflicting transactions.
//!
//! Transactions calling the same target method are candidate sandwich
//! participants, whatever protection they requested or risk they were
//! assessed at. Each such group is shuffled by a permutation seeded from
//! the batch identity and the group's full id set, so no single participant
//! can steer its own slot through fee or timing. Groups are placed as a
//! contiguous block at their earliest member's FIFO slot; everything else
//! keeps its FIFO order.

use super::OrderingContext;
use crate::domain::entities::Placement;
use sha2::{Digest, Sha256};
use shared_types::{
    u256_to_f64, BatchId, PendingTransaction, PoolId, TransactionId,
};
use std::collections::BTreeMap;

/// Target address (lower-cased) and 4-byte method selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConflictKey {
    pub to: String,
    pub selector: [u8; 4],
}

impl ConflictKey {
    pub fn of(pending: &PendingTransaction) -> Option<Self> {
        let tx = &pending.transaction;
        tx.selector().map(|selector| Self {
            to: tx.to.to_lowercase(),
            selector,
        })
    }
}

/// Seed for one group, committed to every member id.
pub fn group_seed(
    pool_id: &PoolId,
    batch_id: BatchId,
    key: &ConflictKey,
    members: &[TransactionId],
) -> [u8; 32] {
    let mut sorted = members.to_vec();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update((pool_id.as_str().len() as u64).to_be_bytes());
    hasher.update(pool_id.as_str().as_bytes());
    hasher.update(batch_id.to_be_bytes());
    hasher.update((key.to.len() as u64).to_be_bytes());
    hasher.update(key.to.as_bytes());
    hasher.update(key.selector);
    for id in &sorted {
        hasher.update(id.as_bytes());
    }
    hasher.finalize().into()
}

fn member_rank(seed: &[u8; 32], id: &TransactionId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(id.as_bytes());
    hasher.finalize().into()
}

/// `1 - estimated_mev / value`, clamped. Zero value scores 1.0 only when
/// nothing is extractable.
pub fn conflicted_score(pending: &PendingTransaction) -> f64 {
    let value = u256_to_f64(pending.transaction.value);
    let mev = pending.risk.estimated_mev;
    if value <= 0.0 {
        return if mev <= 0.0 { 1.0 } else { 0.0 };
    }
    let score = 1.0 - mev / value;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Conflict groups of at least two members, as FIFO indices.
pub fn conflict_groups(eligible: &[PendingTransaction]) -> BTreeMap<ConflictKey, Vec<usize>> {
    let mut groups: BTreeMap<ConflictKey, Vec<usize>> = BTreeMap::new();
    for (index, pending) in eligible.iter().enumerate() {
        if let Some(key) = ConflictKey::of(pending) {
            groups.entry(key).or_default().push(index);
        }
    }
    groups.retain(|_, members| members.len() >= 2);
    groups
}

pub fn order(eligible: &[PendingTransaction], ctx: OrderingContext<'_>) -> Vec<Placement> {
    let len = eligible.len();

    // FIFO index -> shuffled block, keyed by the group's earliest member
    let mut blocks: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut grouped = vec![false; len];
    for (key, mut members) in conflict_groups(eligible) {
        let ids: Vec<TransactionId> = members.iter().map(|&i| eligible[i].id()).collect();
        let seed = group_seed(ctx.pool_id, ctx.batch_id, &key, &ids);
        for &i in &members {
            grouped[i] = true;
        }
        let head = members.iter().copied().min().unwrap_or(0);
        members.sort_by_key(|&i| (member_rank(&seed, &eligible[i].id()), eligible[i].id()));
        blocks.insert(head, members);
    }

    let mut placements = Vec::with_capacity(len);
    for index in 0..len {
        if let Some(block) = blocks.remove(&index) {
            placements.extend(
                block
                    .into_iter()
                    .map(|i| Placement::new(i, conflicted_score(&eligible[i]))),
            );
        } else if !grouped[index] {
            placements.push(Placement::new(index, 1.0));
        }
    }
    placements
}
