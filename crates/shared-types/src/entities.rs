//! # Core Domain Entities
//!
//! Types shared by every fair-ordering subsystem.
//!
//! ## Clusters
//!
//! - **Submission**: `TransactionRequest`, `Transaction`, `ProtectionLevel`
//! - **Risk**: `RiskLevel`, `RiskAssessment`
//! - **Outcome**: `OrderingResult`, `ResultStatus`, `ResultError`, `PoolMetrics`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

pub use primitive_types::U256;

use crate::errors::ErrorCode;

/// Milliseconds since the UNIX epoch.
pub type Timestamp = u64;

/// Per-pool monotonic batch sequence number.
pub type BatchId = u64;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Globally unique transaction identifier, assigned at submission.
///
/// `Ord` compares the UUID bytes, which matches the lexicographic order of
/// the canonical lower-case string form. Ordering algorithms rely on this
/// for their final tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an identifier from a fixed value (tests, replays).
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a fairness domain (a venue or asset pair).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl PoolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PoolId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PoolId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Requested strength of MEV protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ProtectionLevel {
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

/// A transaction as supplied by a client, before the service stamps it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Sender address (chain-specific hex string).
    pub from: String,
    /// Target address (chain-specific hex string).
    pub to: String,
    pub value: U256,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// Opaque payload, typically an encoded contract call.
    #[serde(default)]
    pub data: Vec<u8>,
    /// Earliest acceptable execution time (ms).
    #[serde(default)]
    pub execute_after: Option<Timestamp>,
    /// Latest acceptable execution time (ms).
    #[serde(default)]
    pub execute_before: Option<Timestamp>,
    #[serde(default)]
    pub protection_level: ProtectionLevel,
    /// Tolerated slippage as a fraction in [0, 1].
    pub max_slippage: f64,
}

impl TransactionRequest {
    /// Minimal request with zero value/data, used by tests and tooling.
    pub fn new(from: impl Into<String>, to: impl Into<String>, gas_price: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value: U256::zero(),
            gas_price: U256::from(gas_price),
            gas_limit: 21_000,
            data: Vec::new(),
            execute_after: None,
            execute_before: None,
            protection_level: ProtectionLevel::default(),
            max_slippage: 0.0,
        }
    }

    pub fn with_value(mut self, value: u64) -> Self {
        self.value = U256::from(value);
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_window(mut self, after: Option<Timestamp>, before: Option<Timestamp>) -> Self {
        self.execute_after = after;
        self.execute_before = before;
        self
    }

    pub fn with_protection(mut self, level: ProtectionLevel) -> Self {
        self.protection_level = level;
        self
    }

    pub fn with_slippage(mut self, max_slippage: f64) -> Self {
        self.max_slippage = max_slippage;
        self
    }

    /// Returns true when both window bounds are present and not strictly ordered.
    pub fn has_inverted_window(&self) -> bool {
        matches!(
            (self.execute_after, self.execute_before),
            (Some(after), Some(before)) if after >= before
        )
    }
}

/// A submitted transaction. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from: String,
    pub to: String,
    pub value: U256,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub data: Vec<u8>,
    /// Stamped by the pool manager at enqueue time, never client-supplied.
    pub submitted_at: Timestamp,
    pub execute_after: Option<Timestamp>,
    pub execute_before: Option<Timestamp>,
    pub protection_level: ProtectionLevel,
    pub max_slippage: f64,
}

impl Transaction {
    /// Stamp a client request with its identifier and submission time.
    pub fn from_request(id: TransactionId, request: TransactionRequest, submitted_at: Timestamp) -> Self {
        Self {
            id,
            from: request.from,
            to: request.to,
            value: request.value,
            gas_price: request.gas_price,
            gas_limit: request.gas_limit,
            data: request.data,
            submitted_at,
            execute_after: request.execute_after,
            execute_before: request.execute_before,
            protection_level: request.protection_level,
            max_slippage: request.max_slippage,
        }
    }

    /// First four bytes of the payload (the contract method selector), if any.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data
            .get(..4)
            .map(|bytes| [bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Where `now` falls relative to the execution window.
    pub fn window_position(&self, now: Timestamp) -> WindowPosition {
        if let Some(before) = self.execute_before {
            if before < now {
                return WindowPosition::Lapsed;
            }
        }
        if let Some(after) = self.execute_after {
            if after > now {
                return WindowPosition::NotYet;
            }
        }
        WindowPosition::Eligible
    }
}

/// Position of a closing time relative to a transaction's execution window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    Eligible,
    Lapsed,
    NotYet,
}

/// Returns true for a non-empty address made of hex digits, with optional `0x`.
pub fn is_hex_address(address: &str) -> bool {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Lossy conversion used wherever fees and values enter float arithmetic.
pub fn u256_to_f64(value: U256) -> f64 {
    if value > U256::from(u128::MAX) {
        u128::MAX as f64
    } else {
        value.as_u128() as f64
    }
}

// =============================================================================
// RISK
// =============================================================================

/// Severity of a transaction's MEV exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Advisory classification attached to a transaction at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Non-negative estimate in the same unit as `value`.
    pub estimated_mev: f64,
    /// Names of the heuristics that fired.
    pub detected_risks: BTreeSet<String>,
}

impl RiskAssessment {
    /// Assessment with nothing detected.
    pub fn clean() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            estimated_mev: 0.0,
            detected_risks: BTreeSet::new(),
        }
    }

    /// Fallback used when a transaction cannot be analyzed.
    pub fn unknown(reason: &str) -> Self {
        let mut detected_risks = BTreeSet::new();
        detected_risks.insert(reason.to_string());
        Self {
            risk_level: RiskLevel::Medium,
            estimated_mev: 0.0,
            detected_risks,
        }
    }
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self::clean()
    }
}

/// A transaction waiting in a pool together with its assessment.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub transaction: Transaction,
    pub risk: RiskAssessment,
    /// When the transaction joined its current batch (differs from
    /// `submitted_at` after a deferral).
    pub enqueued_at: Timestamp,
    /// Number of times it was pushed to a later batch.
    pub deferrals: u32,
}

impl PendingTransaction {
    pub fn new(transaction: Transaction, risk: RiskAssessment) -> Self {
        let enqueued_at = transaction.submitted_at;
        Self {
            transaction,
            risk,
            enqueued_at,
            deferrals: 0,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.transaction.id
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Terminal status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultStatus {
    Success,
    Failed,
    Expired,
    Cancelled,
}

/// Error attached to a non-success result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub code: ErrorCode,
    pub message: String,
}

/// The durable per-transaction outcome. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingResult {
    pub transaction_id: TransactionId,
    pub pool_id: PoolId,
    /// 0-indexed position within the batch; only set on success.
    pub final_position: Option<usize>,
    /// In [0, 1]; 0 when the transaction was not ordered.
    pub fairness_score: f64,
    /// Batch that decided the outcome; `None` for cancellations.
    pub batch_id: Option<BatchId>,
    pub closed_at: Timestamp,
    pub status: ResultStatus,
    pub error: Option<ResultError>,
}

impl OrderingResult {
    pub fn success(
        transaction_id: TransactionId,
        pool_id: PoolId,
        batch_id: BatchId,
        position: usize,
        fairness_score: f64,
        closed_at: Timestamp,
    ) -> Self {
        Self {
            transaction_id,
            pool_id,
            final_position: Some(position),
            fairness_score: fairness_score.clamp(0.0, 1.0),
            batch_id: Some(batch_id),
            closed_at,
            status: ResultStatus::Success,
            error: None,
        }
    }

    /// Non-success outcome decided at a batch close.
    pub fn terminal(
        transaction_id: TransactionId,
        pool_id: PoolId,
        batch_id: Option<BatchId>,
        status: ResultStatus,
        code: ErrorCode,
        message: impl Into<String>,
        closed_at: Timestamp,
    ) -> Self {
        Self {
            transaction_id,
            pool_id,
            final_position: None,
            fairness_score: 0.0,
            batch_id,
            closed_at,
            status,
            error: Some(ResultError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Rolling per-pool aggregate, updated incrementally on each batch close.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub pool_id: PoolId,
    /// Results produced by batch closes (all statuses).
    pub total_processed: u64,
    pub total_failed: u64,
    pub total_expired: u64,
    pub total_cancelled: u64,
    pub batches_closed: u64,
    /// Running mean over successful results.
    pub fairness_score: f64,
    /// Number of scores folded into `fairness_score`.
    pub scored_count: u64,
    pub last_batch_closed_at: Option<Timestamp>,
}

impl PoolMetrics {
    pub fn new(pool_id: PoolId) -> Self {
        Self {
            pool_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_with_window(after: Option<u64>, before: Option<u64>) -> Transaction {
        let request = TransactionRequest::new("0xaa", "0xbb", 1).with_window(after, before);
        Transaction::from_request(TransactionId::from_u128(1), request, 100)
    }

    #[test]
    fn test_transaction_id_order_matches_string_order() {
        let a = TransactionId::from_u128(0x0a);
        let b = TransactionId::from_u128(0xf0_0000_0000);
        assert!(a < b);
        assert!(a.to_string() < b.to_string());
    }

    #[test]
    fn test_hex_address_pattern() {
        assert!(is_hex_address("0xDeadBeef"));
        assert!(is_hex_address("abc123"));
        assert!(!is_hex_address(""));
        assert!(!is_hex_address("0x"));
        assert!(!is_hex_address("0xzz"));
    }

    #[test]
    fn test_inverted_window_detection() {
        let ok = TransactionRequest::new("0xa", "0xb", 1).with_window(Some(1), Some(2));
        let equal = TransactionRequest::new("0xa", "0xb", 1).with_window(Some(2), Some(2));
        let open = TransactionRequest::new("0xa", "0xb", 1).with_window(Some(5), None);
        assert!(!ok.has_inverted_window());
        assert!(equal.has_inverted_window());
        assert!(!open.has_inverted_window());
    }

    #[test]
    fn test_window_position() {
        assert_eq!(tx_with_window(None, None).window_position(500), WindowPosition::Eligible);
        assert_eq!(tx_with_window(None, Some(400)).window_position(500), WindowPosition::Lapsed);
        assert_eq!(tx_with_window(None, Some(500)).window_position(500), WindowPosition::Eligible);
        assert_eq!(tx_with_window(Some(600), None).window_position(500), WindowPosition::NotYet);
        assert_eq!(tx_with_window(Some(500), Some(900)).window_position(500), WindowPosition::Eligible);
    }

    #[test]
    fn test_selector_extraction() {
        let mut tx = tx_with_window(None, None);
        assert_eq!(tx.selector(), None);
        tx.data = vec![0x38, 0xed, 0x17, 0x39, 0x00];
        assert_eq!(tx.selector(), Some([0x38, 0xed, 0x17, 0x39]));
    }

    #[test]
    fn test_success_result_clamps_score() {
        let result = OrderingResult::success(
            TransactionId::from_u128(1),
            PoolId::from("p"),
            3,
            0,
            1.7,
            10,
        );
        assert_eq!(result.fairness_score, 1.0);
        assert!(result.is_success());
    }

    #[test]
    fn test_u256_to_f64_saturates() {
        assert_eq!(u256_to_f64(U256::from(42u64)), 42.0);
        assert_eq!(u256_to_f64(U256::MAX), u128::MAX as f64);
    }
}
