//! Splits a closing batch by validity and execution window.

use shared_types::{is_hex_address, PendingTransaction, Timestamp, WindowPosition};

#[derive(Debug, Default)]
pub struct Partition {
    /// Orderable now, in input order.
    pub eligible: Vec<PendingTransaction>,
    /// `execute_before` already passed.
    pub expired: Vec<PendingTransaction>,
    /// `execute_after` still in the future.
    pub not_yet: Vec<PendingTransaction>,
    /// Data the engine cannot order, with the reason.
    pub malformed: Vec<(PendingTransaction, String)>,
}

/// Why a transaction cannot be ordered, if it cannot.
pub fn malformed_reason(pending: &PendingTransaction) -> Option<String> {
    let tx = &pending.transaction;
    if !is_hex_address(&tx.from) {
        return Some(format!("invalid sender address {:?}", tx.from));
    }
    if !is_hex_address(&tx.to) {
        return Some(format!("invalid target address {:?}", tx.to));
    }
    if !(0.0..=1.0).contains(&tx.max_slippage) {
        return Some(format!("max_slippage {} outside [0, 1]", tx.max_slippage));
    }
    None
}

pub fn partition(transactions: Vec<PendingTransaction>, closed_at: Timestamp) -> Partition {
    let mut partition = Partition::default();
    for pending in transactions {
        if let Some(reason) = malformed_reason(&pending) {
            partition.malformed.push((pending, reason));
            continue;
        }
        match pending.transaction.window_position(closed_at) {
            WindowPosition::Eligible => partition.eligible.push(pending),
            WindowPosition::Lapsed => partition.expired.push(pending),
            WindowPosition::NotYet => partition.not_yet.push(pending),
        }
    }
    partition
}
