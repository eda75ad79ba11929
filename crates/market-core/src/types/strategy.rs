//! Strategy identity and configuration.

use crate::types::{ItemId, LocationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A named trading strategy with its full parameter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: Uuid,
    pub name: String,
    pub config: StrategyConfig,
}

impl Strategy {
    pub fn new(name: impl Into<String>, config: StrategyConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            config,
        }
    }
}

/// Explicit strategy configuration.
///
/// Upstream this was an opaque parameter bag; here every knob is a named
/// field with a documented default. Unknown fields in serialized input
/// are ignored, missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Source hub where inventory is bought.
    pub source_hub: LocationId,
    /// Restrict planning to these destinations. `None` plans for every
    /// destination the liquidity snapshot offers.
    pub destinations: Option<Vec<LocationId>>,
    /// Hard cap on the budget handed to the package planner.
    pub budget_cap: Option<Decimal>,
    /// Minimum per-unit margin (fraction of buy price) to plan an item.
    pub min_margin_pct: f64,
    /// Minimum expected total profit for an item to survive planning.
    pub min_total_profit: Decimal,
    /// Planned quantity is avg daily volume times this many days.
    pub max_inventory_days: f64,
    /// Rolling window used for liquidity candidates.
    pub liquidity_window_days: u32,
    /// Liquidity filter: minimum coverage-days / window-days ratio.
    pub min_coverage_ratio: f64,
    /// Liquidity filter: minimum average daily traded ISK value.
    pub min_value_threshold: Decimal,
    /// Liquidity filter: minimum average daily trade count.
    pub min_trade_threshold: f64,
    /// Sales tax percentage on gross sale value.
    pub sales_tax_pct: f64,
    /// Broker fee percentage on listed order value.
    pub broker_fee_pct: f64,
    /// Relist fee percentage on remaining order value per reprice.
    pub relist_fee_pct: f64,
    /// Assumed reprices per day when accruing relist fees.
    pub reprices_per_day: f64,
    /// Margin at or below which a position goes red (terminal).
    pub red_margin_floor: f64,
    /// Assumed share of daily market volume one order captures.
    pub sell_share_pct: f64,
    /// Cash fraction of total assets that triggers a rebuy.
    pub rebuy_trigger_cash_pct: f64,
    /// Fraction of initial capital kept as a cash reserve.
    pub reserve_cash_pct: f64,
    /// Length of one accounting cycle in days.
    pub cycle_length_days: u32,
    /// Upper bound on packages executed per rebuy trigger.
    pub max_packages_per_rebuy: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            source_hub: 60003760,
            destinations: None,
            budget_cap: None,
            min_margin_pct: 0.08,
            min_total_profit: Decimal::new(1_000_000, 0),
            max_inventory_days: 3.0,
            liquidity_window_days: 7,
            min_coverage_ratio: 0.57,
            min_value_threshold: Decimal::new(40_000_000, 0),
            min_trade_threshold: 5.0,
            sales_tax_pct: 0.036,
            broker_fee_pct: 0.015,
            relist_fee_pct: 0.0075,
            reprices_per_day: 1.0,
            red_margin_floor: 0.0,
            sell_share_pct: 0.10,
            rebuy_trigger_cash_pct: 0.5,
            reserve_cash_pct: 0.1,
            cycle_length_days: 7,
            max_packages_per_rebuy: 4,
        }
    }
}

impl StrategyConfig {
    /// Whether planning should consider this destination.
    pub fn allows_destination(&self, destination: LocationId) -> bool {
        match &self.destinations {
            Some(list) => list.contains(&destination),
            None => true,
        }
    }
}

/// How planning treats inventory already held for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryMode {
    /// Always plan the full quantity.
    Ignore,
    /// Skip the pair entirely if any inventory is held.
    SkipExisting,
    /// Reduce the planned quantity by units already held.
    TopOff,
}

/// Whether a run re-buys across cycles or buys once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Consecutive cycles with rebuy triggers; inventory rolls over.
    MultiCycle,
    /// One purchase at the start; the run ends when every position is
    /// sold out or red.
    SingleBuy,
}

/// Daily fill-quantity model for the sell pass.
#[derive(Debug, Clone)]
pub enum FillModel {
    /// Flat share of the day's market volume.
    VolumeShare { share: f64 },
    /// Empirical per-pair capture rates with a global fallback.
    CalibratedCapture {
        share_by_pair: HashMap<(LocationId, ItemId), f64>,
        fallback_share: f64,
    },
}

impl FillModel {
    /// The volume share applied to a specific pair.
    pub fn share_for(&self, location: LocationId, item: ItemId) -> f64 {
        match self {
            FillModel::VolumeShare { share } => *share,
            FillModel::CalibratedCapture {
                share_by_pair,
                fallback_share,
            } => *share_by_pair
                .get(&(location, item))
                .unwrap_or(fallback_share),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StrategyConfig::default();
        assert_eq!(config.liquidity_window_days, 7);
        assert!((config.min_coverage_ratio - 0.57).abs() < f64::EPSILON);
        assert!((config.sell_share_pct - 0.10).abs() < f64::EPSILON);
        assert!(config.allows_destination(12345));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let parsed: StrategyConfig = serde_json::from_str(
            r#"{"sell_share_pct": 0.05, "some_future_knob": true, "another": [1, 2]}"#,
        )
        .unwrap();

        assert!((parsed.sell_share_pct - 0.05).abs() < f64::EPSILON);
        // Everything else falls back to defaults.
        assert_eq!(parsed.cycle_length_days, 7);
    }

    #[test]
    fn test_destination_filter() {
        let config = StrategyConfig {
            destinations: Some(vec![10, 20]),
            ..Default::default()
        };
        assert!(config.allows_destination(10));
        assert!(!config.allows_destination(30));
    }

    #[test]
    fn test_fill_model_fallback() {
        let mut shares = HashMap::new();
        shares.insert((10u64, 34u64), 0.15);
        let model = FillModel::CalibratedCapture {
            share_by_pair: shares,
            fallback_share: 0.04,
        };

        assert!((model.share_for(10, 34) - 0.15).abs() < f64::EPSILON);
        assert!((model.share_for(10, 35) - 0.04).abs() < f64::EPSILON);
    }
}
