//! Liquidity snapshots, purchase plans, and sales history records.

use crate::types::{ItemId, LocationId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One item in a destination's pre-filtered liquidity candidate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityCandidate {
    pub item: ItemId,
    /// Average units traded per day over the window.
    pub avg_daily_volume: f64,
    /// Average ISK value traded per day over the window.
    pub avg_daily_value: Decimal,
    /// Days within the window that had any observation.
    pub coverage_days: u32,
    pub avg_daily_trades: f64,
    pub latest_price: Decimal,
    /// Cargo volume per unit, for packing.
    pub volume_per_unit: f64,
}

/// Candidate list for one destination hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationCandidates {
    pub name: String,
    pub items: Vec<LiquidityCandidate>,
}

/// Raw liquidity candidates per destination, anchored at a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySnapshot {
    pub anchor_date: NaiveDate,
    pub window_days: u32,
    pub destinations: HashMap<LocationId, DestinationCandidates>,
}

/// An item the plan builder hands to the package planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateItem {
    pub item: ItemId,
    pub units: u64,
    pub unit_cost: Decimal,
    /// Expected per-unit profit net of sell-side fees.
    pub unit_profit: Decimal,
    pub volume_per_unit: f64,
}

/// Planner input: surviving candidates grouped by destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateSet {
    pub by_destination: HashMap<LocationId, Vec<CandidateItem>>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.by_destination.values().all(|items| items.is_empty())
    }
}

/// Physical and monetary limits for one shipped package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingConstraints {
    pub max_package_volume: f64,
    pub max_package_value: Decimal,
}

impl Default for PackingConstraints {
    fn default() -> Self {
        Self {
            max_package_volume: 60_000.0,
            max_package_value: Decimal::new(3_000_000_000, 0),
        }
    }
}

/// One line inside a purchase package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageItem {
    pub item: ItemId,
    pub units: u64,
    pub unit_cost: Decimal,
    pub unit_profit: Decimal,
}

/// A concrete all-or-nothing purchase the planner produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasePackage {
    pub destination: LocationId,
    pub items: Vec<PackageItem>,
    /// Goods cost, excluding shipping.
    pub spend: Decimal,
    pub shipping: Decimal,
}

impl PurchasePackage {
    /// Full cash outlay for this package.
    pub fn total_cost(&self) -> Decimal {
        self.spend + self.shipping
    }
}

/// Output of the external package planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanResult {
    pub packages: Vec<PurchasePackage>,
    pub total_spend: Decimal,
    pub total_shipping: Decimal,
}

impl PlanResult {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// One day of the operator's own historical sales for a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub location: LocationId,
    pub item: ItemId,
    pub date: NaiveDate,
    pub units: u64,
}
