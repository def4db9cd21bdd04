//! Stored form of an ordering result.

use serde::{Deserialize, Serialize};
use shared_types::{OrderingResult, Timestamp, TransactionId};

/// Key prefix for result records.
pub const RESULT_PREFIX: &[u8] = b"result/";

pub fn result_key(id: &TransactionId) -> Vec<u8> {
    let mut key = RESULT_PREFIX.to_vec();
    key.extend_from_slice(id.to_string().as_bytes());
    key
}

/// A result plus the time it was written, used by the retention sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResult {
    pub result: OrderingResult,
    pub stored_at: Timestamp,
}

impl StoredResult {
    pub fn is_expired(&self, now: Timestamp, retention_ms: u64) -> bool {
        now.saturating_sub(self.stored_at) > retention_ms
    }
}
