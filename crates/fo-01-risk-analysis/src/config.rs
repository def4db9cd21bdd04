//! Configuration for the Risk Analysis subsystem

use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Heuristic thresholds for the risk analyzer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Gas price multiple of the window median flagged as Medium.
    pub gas_outlier_medium_multiplier: f64,
    /// Gas price multiple of the window median flagged as High.
    pub gas_outlier_high_multiplier: f64,
    /// Minimum window samples before the gas median is trusted.
    pub gas_outlier_min_samples: usize,
    /// Submissions from one sender to one target (inclusive) that form a cluster.
    pub cluster_threshold: usize,
    /// Maximum age of window entries (ms).
    pub window_ms: u64,
    /// Maximum number of window entries kept per pool.
    pub window_capacity: usize,
    /// Lower-case router addresses treated as DEX entry points.
    pub known_routers: Vec<String>,
    /// Hex-encoded 4-byte swap selectors.
    pub known_swap_selectors: Vec<String>,
    /// Value at or above which a transfer is considered large.
    pub large_value_threshold: U256,
    /// Slippage tolerance above which exposure is Medium.
    pub high_slippage: f64,
    /// Slippage tolerance above which exposure is High.
    pub extreme_slippage: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            gas_outlier_medium_multiplier: 1.5,
            gas_outlier_high_multiplier: 3.0,
            gas_outlier_min_samples: 3,
            cluster_threshold: 3,
            window_ms: 12_000,
            window_capacity: 256,
            known_routers: vec![
                // Uniswap V2 router
                "0x7a250d5630b4cf539739df2c5dacb4c659f2488d".into(),
                // Uniswap V3 SwapRouter
                "0xe592427a0aece92de3edee1f18e0157c05861564".into(),
                // Uniswap V3 SwapRouter02
                "0x68b3465833fb72a70ecdf485e0e4c7bd8665fc45".into(),
                // SushiSwap router
                "0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f".into(),
                // 1inch v5 aggregation router
                "0x1111111254eeb25477b68fb85ed929f73a960582".into(),
            ],
            known_swap_selectors: vec![
                "38ed1739".into(), // swapExactTokensForTokens
                "7ff36ab5".into(), // swapExactETHForTokens
                "18cbafe5".into(), // swapExactTokensForETH
                "8803dbee".into(), // swapTokensForExactTokens
                "414bf389".into(), // exactInputSingle
                "c04b8d59".into(), // exactInput
                "5ae401dc".into(), // multicall(uint256,bytes[])
            ],
            // 100 ETH in wei
            large_value_threshold: U256::from(100u64) * U256::exp10(18),
            high_slippage: 0.05,
            extreme_slippage: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RiskConfig::default();
        assert!(config.gas_outlier_high_multiplier > config.gas_outlier_medium_multiplier);
        assert!(config.extreme_slippage > config.high_slippage);
        assert_eq!(config.cluster_threshold, 3);
        assert!(config.known_routers.iter().all(|r| r == &r.to_lowercase()));
    }
}
