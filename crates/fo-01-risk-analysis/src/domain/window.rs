//! Rolling window of recent submissions to one pool.
//!
//! Bounded by age and by capacity. The window is owned by the pool and is
//! only read by the analyzer; the pool records each submission after it has
//! been assessed.

use primitive_types::U256;
use shared_types::{Timestamp, Transaction};
use std::collections::VecDeque;

/// The parts of a submission the clustering heuristics look at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionFingerprint {
    /// Lower-cased sender.
    pub from: String,
    /// Lower-cased target.
    pub to: String,
    pub selector: Option<[u8; 4]>,
    pub gas_price: U256,
    pub seen_at: Timestamp,
}

impl SubmissionFingerprint {
    pub fn of(tx: &Transaction) -> Self {
        Self {
            from: tx.from.to_lowercase(),
            to: tx.to.to_lowercase(),
            selector: tx.selector(),
            gas_price: tx.gas_price,
            seen_at: tx.submitted_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecentWindow {
    entries: VecDeque<SubmissionFingerprint>,
    max_age_ms: u64,
    capacity: usize,
}

impl RecentWindow {
    pub fn new(max_age_ms: u64, capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            max_age_ms,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still inside the window as seen from `now`.
    pub fn live(&self, now: Timestamp) -> impl Iterator<Item = &SubmissionFingerprint> {
        let horizon = now.saturating_sub(self.max_age_ms);
        self.entries.iter().filter(move |e| e.seen_at >= horizon)
    }

    /// Records a submission, dropping entries that aged out or overflow capacity.
    pub fn record(&mut self, tx: &Transaction) {
        self.prune(tx.submitted_at);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(SubmissionFingerprint::of(tx));
    }

    pub fn prune(&mut self, now: Timestamp) {
        let horizon = now.saturating_sub(self.max_age_ms);
        while self.entries.front().is_some_and(|e| e.seen_at < horizon) {
            self.entries.pop_front();
        }
    }

    /// Lower median of live gas prices, if at least `min_samples` are present.
    pub fn median_gas_price(&self, now: Timestamp, min_samples: usize) -> Option<U256> {
        let mut prices: Vec<U256> = self.live(now).map(|e| e.gas_price).collect();
        if prices.is_empty() || prices.len() < min_samples {
            return None;
        }
        prices.sort_unstable();
        Some(prices[(prices.len() - 1) / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{TransactionId, TransactionRequest};

    fn tx(n: u128, gas: u64, at: Timestamp) -> Transaction {
        Transaction::from_request(
            TransactionId::from_u128(n),
            TransactionRequest::new("0xAA", "0xBB", gas),
            at,
        )
    }

    #[test]
    fn test_record_normalizes_addresses() {
        let mut window = RecentWindow::new(1_000, 8);
        window.record(&tx(1, 10, 100));

        let entry = window.live(100).next().unwrap();
        assert_eq!(entry.from, "0xaa");
        assert_eq!(entry.to, "0xbb");
    }

    #[test]
    fn test_capacity_bound() {
        let mut window = RecentWindow::new(1_000_000, 2);
        window.record(&tx(1, 10, 1));
        window.record(&tx(2, 20, 2));
        window.record(&tx(3, 30, 3));

        assert_eq!(window.len(), 2);
        let gas: Vec<_> = window.live(3).map(|e| e.gas_price.as_u64()).collect();
        assert_eq!(gas, vec![20, 30]);
    }

    #[test]
    fn test_age_bound() {
        let mut window = RecentWindow::new(100, 16);
        window.record(&tx(1, 10, 0));
        window.record(&tx(2, 10, 50));
        window.record(&tx(3, 10, 180));

        // Entry at t=0 was pruned on insert at t=180, t=50 is still live at 150
        assert_eq!(window.len(), 2);
        assert_eq!(window.live(150).count(), 2);
        assert_eq!(window.live(200).count(), 1);
    }

    #[test]
    fn test_median_requires_samples() {
        let mut window = RecentWindow::new(10_000, 16);
        window.record(&tx(1, 10, 1));
        window.record(&tx(2, 30, 2));
        assert_eq!(window.median_gas_price(3, 3), None);

        window.record(&tx(3, 20, 3));
        window.record(&tx(4, 40, 4));
        assert_eq!(window.median_gas_price(4, 3), Some(U256::from(20u64)));
    }
}
