//! Shared in-memory fakes for batch orchestration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use market_core::{
    CandidateSet, DateRange, DestinationCandidates, ItemId, LiquidityCandidate, LiquiditySnapshot,
    LocationId, MarketDataProvider, PackageItem, PackagePlanner, PackingConstraints, PlanResult,
    PriceObservation, PurchasePackage, StrategyConfig,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Market data provider backed by canned observations and candidates.
#[derive(Default)]
pub struct FakeMarket {
    observations: Vec<PriceObservation>,
    candidates: HashMap<LocationId, Vec<LiquidityCandidate>>,
    /// Observation queries whose range starts inside this window fail,
    /// simulating an upstream outage for runs anchored there.
    fail_query_starting_in: Option<DateRange>,
    pub observation_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flat_series(
        mut self,
        location: LocationId,
        item: ItemId,
        range: DateRange,
        price: i64,
        volume: u64,
    ) -> Self {
        for date in range.days() {
            self.observations.push(observation(location, item, date, price, volume));
        }
        self
    }

    pub fn with_candidate(
        mut self,
        destination: LocationId,
        candidate: LiquidityCandidate,
    ) -> Self {
        self.candidates.entry(destination).or_default().push(candidate);
        self
    }

    pub fn failing_queries_starting_in(mut self, window: DateRange) -> Self {
        self.fail_query_starting_in = Some(window);
        self
    }
}

#[async_trait]
impl MarketDataProvider for FakeMarket {
    async fn daily_observations(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        range: DateRange,
    ) -> anyhow::Result<Vec<PriceObservation>> {
        self.observation_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(window) = self.fail_query_starting_in {
            if window.contains(range.start) {
                anyhow::bail!("observation store unavailable for {}", range.start);
            }
        }
        Ok(self
            .observations
            .iter()
            .filter(|o| {
                locations.contains(&o.location) && items.contains(&o.item) && range.contains(o.date)
            })
            .cloned()
            .collect())
    }

    async fn liquidity_candidates(
        &self,
        anchor_date: NaiveDate,
        window_days: u32,
    ) -> anyhow::Result<LiquiditySnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(LiquiditySnapshot {
            anchor_date,
            window_days,
            destinations: self
                .candidates
                .iter()
                .map(|(destination, items)| {
                    (
                        *destination,
                        DestinationCandidates {
                            name: format!("hub-{destination}"),
                            items: items.clone(),
                        },
                    )
                })
                .collect(),
        })
    }
}

/// Packer that puts every candidate of a destination into one package.
pub struct FakePlanner;

#[async_trait]
impl PackagePlanner for FakePlanner {
    async fn plan(
        &self,
        candidates: &CandidateSet,
        _budget: Decimal,
        _constraints: &PackingConstraints,
    ) -> anyhow::Result<PlanResult> {
        let mut destinations: Vec<_> = candidates.by_destination.keys().copied().collect();
        destinations.sort_unstable();

        let mut packages = Vec::new();
        for destination in destinations {
            let items = &candidates.by_destination[&destination];
            let lines: Vec<PackageItem> = items
                .iter()
                .map(|c| PackageItem {
                    item: c.item,
                    units: c.units,
                    unit_cost: c.unit_cost,
                    unit_profit: c.unit_profit,
                })
                .collect();
            let spend: Decimal = lines
                .iter()
                .map(|l| l.unit_cost * Decimal::from(l.units))
                .sum();
            packages.push(PurchasePackage {
                destination,
                items: lines,
                spend,
                shipping: Decimal::ZERO,
            });
        }

        let total_spend = packages.iter().map(|p| p.spend).sum();
        Ok(PlanResult {
            packages,
            total_spend,
            total_shipping: Decimal::ZERO,
        })
    }
}

pub fn observation(
    location: LocationId,
    item: ItemId,
    date: NaiveDate,
    price: i64,
    volume: u64,
) -> PriceObservation {
    PriceObservation {
        location,
        item,
        date,
        high: Decimal::from(price),
        low: Decimal::from(price),
        avg: Decimal::from(price),
        volume,
    }
}

pub fn candidate(item: ItemId, avg_daily_volume: f64) -> LiquidityCandidate {
    LiquidityCandidate {
        item,
        avg_daily_volume,
        avg_daily_value: Decimal::new(100_000_000, 0),
        coverage_days: 7,
        avg_daily_trades: 20.0,
        latest_price: Decimal::new(100, 0),
        volume_per_unit: 1.0,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

/// Fee-free strategy config that plans everything the market offers.
pub fn open_config(source_hub: LocationId) -> StrategyConfig {
    StrategyConfig {
        source_hub,
        min_margin_pct: 0.0,
        min_total_profit: Decimal::ZERO,
        max_inventory_days: 1.0,
        min_coverage_ratio: 0.0,
        min_value_threshold: Decimal::ZERO,
        min_trade_threshold: 0.0,
        sales_tax_pct: 0.0,
        broker_fee_pct: 0.0,
        relist_fee_pct: 0.0,
        red_margin_floor: 0.0,
        rebuy_trigger_cash_pct: 2.0,
        reserve_cash_pct: 0.0,
        ..Default::default()
    }
}
