//! MEV exposure heuristics.
//!
//! Each heuristic inspects a transaction (and the pool's recent window) and
//! yields at most one finding. Findings are additive; severity aggregation
//! happens in [`aggregate_level`].

use super::window::RecentWindow;
use crate::config::RiskConfig;
use primitive_types::U256;
use shared_types::{u256_to_f64, RiskLevel, Transaction};
use std::collections::HashSet;

pub const HIGH_GAS_OUTLIER: &str = "high_gas_outlier";
pub const KNOWN_ROUTER_CALL: &str = "known_router_call";
pub const REPEATED_SUBMISSION_CLUSTER: &str = "repeated_submission_cluster";
pub const SANDWICH_PATTERN: &str = "sandwich_pattern";
pub const LARGE_VALUE_TRANSFER: &str = "large_value_transfer";
pub const HIGH_SLIPPAGE_TOLERANCE: &str = "high_slippage_tolerance";
pub const UNANALYZABLE_INPUT: &str = "unanalyzable_input";

/// One triggered heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Finding {
    pub name: &'static str,
    pub severity: RiskLevel,
}

impl Finding {
    fn new(name: &'static str, severity: RiskLevel) -> Self {
        Self { name, severity }
    }
}

/// Gas price compared with the window median.
pub fn gas_outlier(tx: &Transaction, window: &RecentWindow, config: &RiskConfig) -> Option<Finding> {
    let median = window.median_gas_price(tx.submitted_at, config.gas_outlier_min_samples)?;
    if median.is_zero() {
        return (!tx.gas_price.is_zero()).then(|| Finding::new(HIGH_GAS_OUTLIER, RiskLevel::High));
    }

    let ratio = u256_to_f64(tx.gas_price) / u256_to_f64(median);
    if ratio >= config.gas_outlier_high_multiplier {
        Some(Finding::new(HIGH_GAS_OUTLIER, RiskLevel::High))
    } else if ratio >= config.gas_outlier_medium_multiplier {
        Some(Finding::new(HIGH_GAS_OUTLIER, RiskLevel::Medium))
    } else {
        None
    }
}

/// Calls into a known DEX router or with a known swap selector.
pub fn router_call(
    tx: &Transaction,
    routers: &HashSet<String>,
    selectors: &HashSet<[u8; 4]>,
) -> Option<Finding> {
    let to_router = routers.contains(&tx.to.to_lowercase());
    let swap_selector = tx.selector().is_some_and(|s| selectors.contains(&s));
    (to_router || swap_selector).then(|| Finding::new(KNOWN_ROUTER_CALL, RiskLevel::Medium))
}

/// Same sender hitting the same target repeatedly inside the window.
pub fn submission_cluster(
    tx: &Transaction,
    window: &RecentWindow,
    config: &RiskConfig,
) -> Option<Finding> {
    let from = tx.from.to_lowercase();
    let to = tx.to.to_lowercase();
    let prior = window
        .live(tx.submitted_at)
        .filter(|e| e.from == from && e.to == to)
        .count();
    (prior + 1 >= config.cluster_threshold)
        .then(|| Finding::new(REPEATED_SUBMISSION_CLUSTER, RiskLevel::High))
}

/// A different sender recently called the same target method.
pub fn sandwich_pattern(tx: &Transaction, window: &RecentWindow) -> Option<Finding> {
    let selector = tx.selector()?;
    let from = tx.from.to_lowercase();
    let to = tx.to.to_lowercase();
    window
        .live(tx.submitted_at)
        .any(|e| e.to == to && e.selector == Some(selector) && e.from != from)
        .then(|| Finding::new(SANDWICH_PATTERN, RiskLevel::High))
}

pub fn large_value(tx: &Transaction, threshold: U256) -> Option<Finding> {
    (tx.value >= threshold).then(|| Finding::new(LARGE_VALUE_TRANSFER, RiskLevel::Medium))
}

pub fn slippage_tolerance(tx: &Transaction, config: &RiskConfig) -> Option<Finding> {
    let slippage = tx.max_slippage;
    if !slippage.is_finite() {
        return None;
    }
    if slippage > config.extreme_slippage {
        Some(Finding::new(HIGH_SLIPPAGE_TOLERANCE, RiskLevel::High))
    } else if slippage > config.high_slippage {
        Some(Finding::new(HIGH_SLIPPAGE_TOLERANCE, RiskLevel::Medium))
    } else {
        None
    }
}

/// Maximum severity, escalated to Critical when two or more High findings coincide.
pub fn aggregate_level(findings: &[Finding]) -> RiskLevel {
    let high_count = findings
        .iter()
        .filter(|f| f.severity >= RiskLevel::High)
        .count();
    if high_count >= 2 {
        return RiskLevel::Critical;
    }
    findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(RiskLevel::Low)
}

/// Value exposed to extraction: `value × slippage × exposure`.
pub fn estimate_mev(tx: &Transaction, findings: &[Finding]) -> f64 {
    let exposure = if findings.iter().any(|f| f.name == SANDWICH_PATTERN) {
        1.0
    } else if findings.iter().any(|f| f.name == KNOWN_ROUTER_CALL) {
        0.5
    } else {
        0.0
    };
    let slippage = if tx.max_slippage.is_finite() {
        tx.max_slippage.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (u256_to_f64(tx.value) * slippage * exposure).max(0.0)
}
