//! Environment configuration for batch execution defaults.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use tracing::warn;

/// Defaults that batch orchestration reads from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct LabConfig {
    /// Worker pool size for batch simulation.
    pub concurrency: usize,
    pub min_coverage_ratio: f64,
    pub min_value_threshold: Decimal,
    pub min_trade_threshold: f64,
    /// Global capture-share fallback when a pair has no own-sales history.
    pub fallback_share: f64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            min_coverage_ratio: 0.57,
            min_value_threshold: Decimal::new(40_000_000, 0),
            min_trade_threshold: 5.0,
            fallback_share: 0.05,
        }
    }
}

impl LabConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            concurrency: parse_var("LAB_CONCURRENCY", defaults.concurrency),
            min_coverage_ratio: parse_var("LAB_MIN_COVERAGE_RATIO", defaults.min_coverage_ratio),
            min_value_threshold: parse_var("LAB_MIN_VALUE_THRESHOLD", defaults.min_value_threshold),
            min_trade_threshold: parse_var("LAB_MIN_TRADE_THRESHOLD", defaults.min_trade_threshold),
            fallback_share: parse_var("LAB_FALLBACK_SHARE", defaults.fallback_share),
        }
    }
}

fn parse_var<T: FromStr + std::fmt::Debug>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(var = name, raw = %raw, default = ?default, "Unparsable env value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
