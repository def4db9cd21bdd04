//! Risk Analysis Service
//!
//! Runs every heuristic against a transaction and folds the findings into a
//! `RiskAssessment`.

use crate::config::RiskConfig;
use crate::domain::heuristics::{self, Finding, UNANALYZABLE_INPUT};
use crate::domain::window::RecentWindow;
use crate::ports::inbound::RiskAnalysisApi;
use shared_types::{is_hex_address, RiskAssessment, Transaction};
use std::collections::HashSet;
use tracing::{debug, warn};

pub struct RiskAnalyzer {
    config: RiskConfig,
    routers: HashSet<String>,
    swap_selectors: HashSet<[u8; 4]>,
}

impl RiskAnalyzer {
    pub fn new(config: RiskConfig) -> Self {
        let routers = config
            .known_routers
            .iter()
            .map(|r| r.to_lowercase())
            .collect();

        let swap_selectors = config
            .known_swap_selectors
            .iter()
            .filter_map(|s| decode_selector(s))
            .collect();

        Self {
            config,
            routers,
            swap_selectors,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Fresh window sized from this analyzer's config.
    pub fn new_window(&self) -> RecentWindow {
        RecentWindow::new(self.config.window_ms, self.config.window_capacity)
    }

    fn findings(&self, tx: &Transaction, window: &RecentWindow) -> Vec<Finding> {
        [
            heuristics::gas_outlier(tx, window, &self.config),
            heuristics::router_call(tx, &self.routers, &self.swap_selectors),
            heuristics::submission_cluster(tx, window, &self.config),
            heuristics::sandwich_pattern(tx, window),
            heuristics::large_value(tx, self.config.large_value_threshold),
            heuristics::slippage_tolerance(tx, &self.config),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskAnalysisApi for RiskAnalyzer {
    fn assess(&self, tx: &Transaction, window: &RecentWindow) -> RiskAssessment {
        if !is_hex_address(&tx.from) || !is_hex_address(&tx.to) {
            debug!(tx_id = %tx.id, "Addresses not analyzable, defaulting to Medium");
            return RiskAssessment::unknown(UNANALYZABLE_INPUT);
        }

        let findings = self.findings(tx, window);
        let assessment = RiskAssessment {
            risk_level: heuristics::aggregate_level(&findings),
            estimated_mev: heuristics::estimate_mev(tx, &findings),
            detected_risks: findings.iter().map(|f| f.name.to_string()).collect(),
        };

        debug!(
            tx_id = %tx.id,
            risk_level = ?assessment.risk_level,
            estimated_mev = assessment.estimated_mev,
            findings = findings.len(),
            "Assessed transaction"
        );

        assessment
    }
}

fn decode_selector(raw: &str) -> Option<[u8; 4]> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    match hex::decode(digits) {
        Ok(bytes) if bytes.len() == 4 => Some([bytes[0], bytes[1], bytes[2], bytes[3]]),
        _ => {
            warn!(selector = raw, "Ignoring invalid swap selector");
            None
        }
    }
}
