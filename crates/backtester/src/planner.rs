//! Historical plan builder.
//!
//! Turns a point-in-time liquidity snapshot into a concrete purchase
//! plan: filter candidates, price both sides as of the day before the
//! anchor, gate on margin, then hand the survivors to the external
//! package planner.

use crate::liquidity::{filter_candidates, LiquidityThresholds};
use crate::resolver::{ObservationGrid, PriceResolver, AS_OF_LOOKBACK_DAYS};
use anyhow::Result;
use chrono::{Days, NaiveDate};
use futures_util::future::BoxFuture;
use market_core::fees::{margin_pct, net_sell};
use market_core::{
    Blacklist, CandidateItem, CandidateSet, DateRange, Error, InventoryMode, ItemId,
    LiquiditySnapshot, LocationId, MarketDataProvider, PackagePlanner, PackingConstraints,
    PlanResult, PriceModel, StrategyConfig,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Fetches a raw liquidity snapshot for `(anchor_date, window_days)`.
///
/// Injected so batch orchestration can route every fetch through its
/// shared read-through cache without this crate depending on it.
pub type SnapshotFetcher =
    Arc<dyn Fn(NaiveDate, u32) -> BoxFuture<'static, Result<Arc<LiquiditySnapshot>>> + Send + Sync>;

/// A fetcher that always goes straight to the provider.
pub fn direct_fetcher(market: Arc<dyn MarketDataProvider>) -> SnapshotFetcher {
    Arc::new(move |anchor_date, window_days| {
        let market = Arc::clone(&market);
        Box::pin(async move {
            market
                .liquidity_candidates(anchor_date, window_days)
                .await
                .map(Arc::new)
        })
    })
}

/// A purchase plan plus the buy price of every item it references.
///
/// The map is guaranteed to cover every item in every package; a miss
/// at execution time is an internal-consistency error, not a data gap.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub plan: PlanResult,
    pub buy_price_by_item: HashMap<ItemId, Decimal>,
}

impl PlanOutcome {
    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }
}

/// Builds purchase plans from historical data only.
pub struct HistoricalPlanBuilder {
    resolver: PriceResolver,
    snapshots: SnapshotFetcher,
    packer: Arc<dyn PackagePlanner>,
    constraints: PackingConstraints,
}

impl HistoricalPlanBuilder {
    pub fn new(
        resolver: PriceResolver,
        snapshots: SnapshotFetcher,
        packer: Arc<dyn PackagePlanner>,
        constraints: PackingConstraints,
    ) -> Self {
        Self {
            resolver,
            snapshots,
            packer,
            constraints,
        }
    }

    /// Build a plan anchored at `anchor_date`. Planning only ever sees
    /// history strictly before the anchor day.
    #[allow(clippy::too_many_arguments)]
    pub async fn build_plan(
        &self,
        config: &StrategyConfig,
        anchor_date: NaiveDate,
        price_model: PriceModel,
        budget: Decimal,
        existing_inventory: &HashMap<(LocationId, ItemId), u64>,
        inventory_mode: InventoryMode,
        blacklist: &Blacklist,
    ) -> Result<PlanOutcome> {
        let Some(plan_anchor) = anchor_date.pred_opt() else {
            return Ok(PlanOutcome::default());
        };

        let budget = match config.budget_cap {
            Some(cap) => budget.min(cap),
            None => budget,
        };
        if budget <= Decimal::ZERO {
            return Ok(PlanOutcome::default());
        }

        let snapshot = (self.snapshots)(plan_anchor, config.liquidity_window_days).await?;
        let thresholds = LiquidityThresholds::from_strategy(config);

        // Filter each destination's candidates before pricing anything.
        let mut destinations: Vec<LocationId> = snapshot
            .destinations
            .keys()
            .copied()
            .filter(|d| config.allows_destination(*d))
            .collect();
        destinations.sort_unstable();

        let mut filtered: Vec<(LocationId, Vec<_>)> = Vec::new();
        for destination in destinations {
            let Some(candidates) = snapshot.destinations.get(&destination) else {
                continue;
            };
            let kept = filter_candidates(
                &candidates.items,
                config.liquidity_window_days,
                &thresholds,
                blacklist,
                destination,
            );
            if !kept.is_empty() {
                filtered.push((destination, kept));
            }
        }
        if filtered.is_empty() {
            return Ok(PlanOutcome::default());
        }

        let grid = self.price_grid(config, &filtered, plan_anchor).await?;

        let mut set = CandidateSet::default();
        let mut buy_price_by_item: HashMap<ItemId, Decimal> = HashMap::new();

        for (destination, candidates) in filtered {
            let mut survivors = Vec::new();
            for candidate in candidates {
                let Some(buy_obs) = grid.as_of(config.source_hub, candidate.item, plan_anchor)
                else {
                    continue;
                };
                let Some(sell_obs) = grid.as_of(destination, candidate.item, plan_anchor) else {
                    continue;
                };

                let buy_price = buy_obs.price(price_model);
                let sell_price = sell_obs.price(price_model);
                if buy_price <= Decimal::ZERO || sell_price <= Decimal::ZERO {
                    continue;
                }

                let net_unit = net_sell(sell_price, config.sales_tax_pct, config.broker_fee_pct);
                let unit_profit = net_unit - buy_price;
                if margin_pct(net_unit, buy_price) < config.min_margin_pct {
                    continue;
                }

                let held = existing_inventory
                    .get(&(destination, candidate.item))
                    .copied()
                    .unwrap_or(0);
                let units = planned_quantity(
                    candidate.avg_daily_volume,
                    config.max_inventory_days,
                    held,
                    inventory_mode,
                );
                if units == 0 {
                    continue;
                }
                if unit_profit * Decimal::from(units) < config.min_total_profit {
                    continue;
                }

                survivors.push(CandidateItem {
                    item: candidate.item,
                    units,
                    unit_cost: buy_price,
                    unit_profit,
                    volume_per_unit: candidate.volume_per_unit,
                });
                buy_price_by_item.insert(candidate.item, buy_price);
            }
            if !survivors.is_empty() {
                set.by_destination.insert(destination, survivors);
            }
        }

        if set.is_empty() {
            debug!(anchor = %plan_anchor, "No candidates survived planning");
            return Ok(PlanOutcome::default());
        }

        let plan = self.packer.plan(&set, budget, &self.constraints).await?;

        // Every planned item must have a buy price; anything else is an
        // internal-consistency violation.
        for package in &plan.packages {
            for line in &package.items {
                if !buy_price_by_item.contains_key(&line.item) {
                    return Err(Error::MissingBuyPrice {
                        item: line.item,
                        destination: package.destination,
                    }
                    .into());
                }
            }
        }

        Ok(PlanOutcome {
            plan,
            buy_price_by_item,
        })
    }

    /// One batch fetch covering the source hub and every destination.
    async fn price_grid(
        &self,
        config: &StrategyConfig,
        filtered: &[(LocationId, Vec<market_core::LiquidityCandidate>)],
        plan_anchor: NaiveDate,
    ) -> Result<ObservationGrid> {
        let mut locations: Vec<LocationId> =
            filtered.iter().map(|(destination, _)| *destination).collect();
        locations.push(config.source_hub);
        locations.sort_unstable();
        locations.dedup();

        let mut items: Vec<ItemId> = filtered
            .iter()
            .flat_map(|(_, candidates)| candidates.iter().map(|c| c.item))
            .collect();
        items.sort_unstable();
        items.dedup();

        let start = plan_anchor
            .checked_sub_days(Days::new(AS_OF_LOOKBACK_DAYS))
            .unwrap_or(plan_anchor);
        let range = DateRange::new(start, plan_anchor)?;

        self.resolver.resolve_many(&locations, &items, range).await
    }
}

/// Planned quantity for a candidate given inventory already held.
/// Returns 0 when the pair should be skipped entirely.
fn planned_quantity(
    avg_daily_volume: f64,
    max_inventory_days: f64,
    held: u64,
    mode: InventoryMode,
) -> u64 {
    let full = (avg_daily_volume * max_inventory_days).floor().max(0.0) as u64;
    match mode {
        InventoryMode::Ignore => full,
        InventoryMode::SkipExisting => {
            if held > 0 {
                0
            } else {
                full
            }
        }
        InventoryMode::TopOff => full.saturating_sub(held),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planned_quantity_ignore() {
        assert_eq!(planned_quantity(500.0, 3.0, 9999, InventoryMode::Ignore), 1500);
    }

    #[test]
    fn test_planned_quantity_skip_existing() {
        assert_eq!(planned_quantity(500.0, 3.0, 0, InventoryMode::SkipExisting), 1500);
        assert_eq!(planned_quantity(500.0, 3.0, 1, InventoryMode::SkipExisting), 0);
    }

    #[test]
    fn test_planned_quantity_top_off() {
        assert_eq!(planned_quantity(500.0, 3.0, 400, InventoryMode::TopOff), 1100);
        // Holding at least the full quantity skips the pair.
        assert_eq!(planned_quantity(500.0, 3.0, 1500, InventoryMode::TopOff), 0);
        assert_eq!(planned_quantity(500.0, 3.0, 2000, InventoryMode::TopOff), 0);
    }

    #[test]
    fn test_planned_quantity_floors() {
        assert_eq!(planned_quantity(10.4, 1.0, 0, InventoryMode::Ignore), 10);
    }
}
