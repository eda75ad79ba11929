//! Liquidity gating for planning candidates.

use market_core::{Blacklist, LiquidityCandidate, LocationId, StrategyConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum activity a candidate must show over the liquidity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityThresholds {
    pub min_coverage_ratio: f64,
    pub min_value_threshold: Decimal,
    pub min_trade_threshold: f64,
}

impl Default for LiquidityThresholds {
    fn default() -> Self {
        Self {
            min_coverage_ratio: 0.57,
            min_value_threshold: Decimal::new(40_000_000, 0),
            min_trade_threshold: 5.0,
        }
    }
}

impl LiquidityThresholds {
    pub fn from_strategy(config: &StrategyConfig) -> Self {
        Self {
            min_coverage_ratio: config.min_coverage_ratio,
            min_value_threshold: config.min_value_threshold,
            min_trade_threshold: config.min_trade_threshold,
        }
    }
}

/// Keep candidates that clear every liquidity threshold, then drop
/// anything on the global or per-destination blacklist.
pub fn filter_candidates(
    candidates: &[LiquidityCandidate],
    window_days: u32,
    thresholds: &LiquidityThresholds,
    blacklist: &Blacklist,
    destination: LocationId,
) -> Vec<LiquidityCandidate> {
    let window = window_days.max(1) as f64;

    candidates
        .iter()
        .filter(|c| {
            let coverage = c.coverage_days as f64 / window;
            coverage >= thresholds.min_coverage_ratio
                && c.avg_daily_value >= thresholds.min_value_threshold
                && c.avg_daily_trades >= thresholds.min_trade_threshold
        })
        .filter(|c| !blacklist.contains(destination, c.item))
        .cloned()
        .collect()
}
