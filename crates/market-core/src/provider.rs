//! External collaborator interfaces.
//!
//! The engine consumes these as trait objects; production wiring and
//! tests supply their own implementations.

use crate::types::market::{CandidateSet, LiquiditySnapshot, PackingConstraints, PlanResult, SaleRecord};
use crate::types::observation::PriceObservation;
use crate::types::{DateRange, ItemId, LocationId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Supplies daily aggregated order-book statistics and pre-filtered
/// liquidity candidate lists.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// All observations for the given pairs within the date range.
    /// Missing (pair, day) combinations are simply absent from the
    /// result; that is not an error.
    async fn daily_observations(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        range: DateRange,
    ) -> Result<Vec<PriceObservation>>;

    /// Raw liquidity candidates per destination, computed over the
    /// rolling window ending at `anchor_date`.
    async fn liquidity_candidates(
        &self,
        anchor_date: NaiveDate,
        window_days: u32,
    ) -> Result<LiquiditySnapshot>;
}

/// Bin-packing optimizer turning a candidate list and a budget into
/// concrete purchase packages. Internal algorithm is out of scope.
#[async_trait]
pub trait PackagePlanner: Send + Sync {
    async fn plan(
        &self,
        candidates: &CandidateSet,
        budget: Decimal,
        constraints: &PackingConstraints,
    ) -> Result<PlanResult>;
}

/// The operator's own historical sales, used by capture calibration.
#[async_trait]
pub trait SalesHistory: Send + Sync {
    async fn own_sales(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        range: DateRange,
    ) -> Result<Vec<SaleRecord>>;
}
