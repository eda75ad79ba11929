//! Inventory positions held by a simulation run.

use crate::types::{ItemId, LocationId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inventory held at one destination for one item within a run.
///
/// Invariants maintained by the mutators:
/// `units_remaining() == planned_units - units_sold` (never negative) and
/// `cost_basis_remaining() == avg_unit_cost * units_remaining()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub destination: LocationId,
    pub item: ItemId,
    /// Units allocated to this pair, including later rebuys.
    pub planned_units: u64,
    /// Weighted-average acquisition cost per unit.
    pub avg_unit_cost: Decimal,
    pub units_sold: u64,
    /// Current listed sell price; `None` until first listed.
    pub listed_price: Option<Decimal>,
    /// Terminal-for-selling flag. Once set it is never cleared.
    pub red: bool,
    /// Sales net of fees minus cost of goods sold, for this pair.
    pub realized_profit: Decimal,
}

impl Position {
    pub fn new(destination: LocationId, item: ItemId, units: u64, unit_cost: Decimal) -> Self {
        Self {
            destination,
            item,
            planned_units: units,
            avg_unit_cost: unit_cost,
            units_sold: 0,
            listed_price: None,
            red: false,
            realized_profit: Decimal::ZERO,
        }
    }

    pub fn units_remaining(&self) -> u64 {
        self.planned_units - self.units_sold
    }

    pub fn cost_basis_remaining(&self) -> Decimal {
        self.avg_unit_cost * Decimal::from(self.units_remaining())
    }

    pub fn is_sold_out(&self) -> bool {
        self.units_remaining() == 0
    }

    /// Eligible for the daily listing/selling pass.
    pub fn is_active(&self) -> bool {
        !self.red && !self.is_sold_out()
    }

    /// Fold additional units into the weighted-average unit cost.
    pub fn add_units(&mut self, units: u64, unit_cost: Decimal) {
        if units == 0 {
            return;
        }
        let held = Decimal::from(self.units_remaining());
        let added = Decimal::from(units);
        let blended = (self.avg_unit_cost * held + unit_cost * added) / (held + added);
        self.avg_unit_cost = blended;
        self.planned_units += units;
    }

    /// Record a fill of `units` at `net_unit_price` (already net of tax
    /// and broker margin). Returns the gross proceeds credited to cash.
    pub fn record_sale(&mut self, units: u64, net_unit_price: Decimal) -> Decimal {
        debug_assert!(units <= self.units_remaining());
        let proceeds = net_unit_price * Decimal::from(units);
        let cogs = self.avg_unit_cost * Decimal::from(units);
        self.units_sold += units;
        self.realized_profit += proceeds - cogs;
        proceeds
    }

    /// Attribute a listing or relist fee to this pair.
    pub fn charge_fee(&mut self, amount: Decimal) {
        self.realized_profit -= amount;
    }

    pub fn mark_red(&mut self) {
        self.red = true;
    }
}
