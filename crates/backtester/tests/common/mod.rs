//! Shared in-memory fakes for engine integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use backtester::{direct_fetcher, CycleSimulator, HistoricalPlanBuilder, PriceResolver};
use chrono::NaiveDate;
use market_core::{
    CandidateSet, DateRange, DestinationCandidates, ItemId, LiquidityCandidate, LiquiditySnapshot,
    LocationId, MarketDataProvider, PackageItem, PackagePlanner, PackingConstraints, PlanResult,
    PriceObservation, PurchasePackage, SaleRecord, SalesHistory, StrategyConfig,
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
    pub observation_calls: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
}

impl FakeMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flat daily price/volume series for a pair across `range`.
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

    /// Add explicit `(date, price, volume)` points for a pair.
    pub fn with_series(
        mut self,
        location: LocationId,
        item: ItemId,
        points: &[(NaiveDate, i64, u64)],
    ) -> Self {
        for &(date, price, volume) in points {
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
pub struct FakePlanner {
    pub shipping_per_package: Decimal,
}

impl FakePlanner {
    pub fn free_shipping() -> Self {
        Self {
            shipping_per_package: Decimal::ZERO,
        }
    }
}

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
                shipping: self.shipping_per_package,
            });
        }

        let total_spend = packages.iter().map(|p| p.spend).sum();
        let total_shipping = packages.iter().map(|p| p.shipping).sum();
        Ok(PlanResult {
            packages,
            total_spend,
            total_shipping,
        })
    }
}

/// Packer that returns a package line the builder never offered.
pub struct BogusPlanner;

#[async_trait]
impl PackagePlanner for BogusPlanner {
    async fn plan(
        &self,
        candidates: &CandidateSet,
        _budget: Decimal,
        _constraints: &PackingConstraints,
    ) -> anyhow::Result<PlanResult> {
        let destination = candidates
            .by_destination
            .keys()
            .copied()
            .next()
            .unwrap_or(1);
        let package = PurchasePackage {
            destination,
            items: vec![PackageItem {
                item: 999_999,
                units: 10,
                unit_cost: Decimal::ONE,
                unit_profit: Decimal::ONE,
            }],
            spend: Decimal::new(10, 0),
            shipping: Decimal::ZERO,
        };
        Ok(PlanResult {
            total_spend: package.spend,
            total_shipping: Decimal::ZERO,
            packages: vec![package],
        })
    }
}

/// Canned own-sales history.
pub struct FakeSales {
    pub records: Vec<SaleRecord>,
}

#[async_trait]
impl SalesHistory for FakeSales {
    async fn own_sales(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        range: DateRange,
    ) -> anyhow::Result<Vec<SaleRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                locations.contains(&r.location) && items.contains(&r.item) && range.contains(r.date)
            })
            .cloned()
            .collect())
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
        // High enough that the trigger never fires unless a test wants it.
        rebuy_trigger_cash_pct: 2.0,
        reserve_cash_pct: 0.0,
        ..Default::default()
    }
}

pub fn build_simulator(
    market: Arc<FakeMarket>,
    packer: Arc<dyn PackagePlanner>,
) -> CycleSimulator {
    let provider: Arc<dyn MarketDataProvider> = market;
    let resolver = PriceResolver::new(Arc::clone(&provider));
    let builder = HistoricalPlanBuilder::new(
        resolver,
        direct_fetcher(Arc::clone(&provider)),
        packer,
        PackingConstraints::default(),
    );
    CycleSimulator::new(provider, Arc::new(builder))
}
