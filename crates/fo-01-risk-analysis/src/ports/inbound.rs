//! Inbound Ports (Driving Ports / API)

use crate::domain::window::RecentWindow;
use shared_types::{RiskAssessment, Transaction};

/// Classifies a transaction's MEV exposure.
///
/// Assessment is advisory and infallible: input that cannot be analyzed
/// yields a Medium assessment tagged `unanalyzable_input` instead of an
/// error. The window is the pool's recent submissions, excluding `tx`.
pub trait RiskAnalysisApi: Send + Sync {
    fn assess(&self, tx: &Transaction, window: &RecentWindow) -> RiskAssessment;
}
