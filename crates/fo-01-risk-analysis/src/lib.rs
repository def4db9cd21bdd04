//! # FO-01: Risk Analysis Subsystem
//!
//! Classifies each submitted transaction's MEV exposure from the transaction
//! itself and the pool's recent submission window.
//!
//! ## Architecture
//!
//! - **Domain**: Heuristics, severity aggregation, rolling window
//! - **Ports**: Inbound (`RiskAnalysisApi`)
//! - **Service**: `RiskAnalyzer`
//!
//! ## Heuristics
//!
//! | Finding | Severity |
//! |---------|----------|
//! | `high_gas_outlier` | Medium at 1.5x the window median, High at 3x |
//! | `known_router_call` | Medium |
//! | `repeated_submission_cluster` | High |
//! | `sandwich_pattern` | High |
//! | `large_value_transfer` | Medium |
//! | `high_slippage_tolerance` | Medium above 5%, High above 20% |
//!
//! Two or more High findings escalate the assessment to Critical.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::RiskConfig;
pub use domain::window::{RecentWindow, SubmissionFingerprint};
pub use ports::inbound::RiskAnalysisApi;
pub use service::RiskAnalyzer;
