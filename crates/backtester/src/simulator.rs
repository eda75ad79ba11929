//! Position ledger and day-by-day cycle simulator.
//!
//! The central state machine: holds per-(destination, item) positions
//! and simulates one strategy over one date range, one day at a time.
//! Each day runs listing/reprice, selling, an optional rebuy, then
//! mark-to-market. All cash movements are affordability-gated: a fee or
//! package that cannot be paid skips the action, never the run.

use crate::planner::{HistoricalPlanBuilder, PlanOutcome};
use crate::resolver::{ObservationGrid, PriceResolver};
use anyhow::Result;
use chrono::NaiveDate;
use market_core::fees::{dec, listing_fee, margin_pct, net_sell, next_cheaper_tick, relist_fee};
use market_core::{
    Blacklist, CycleSummary, DateRange, DayRecord, Error, FillModel, InventoryMode, ItemId,
    LocationId, MarketDataProvider, Position, PriceModel, RunMode, RunSummary, SimulationRun,
    Strategy, StrategyConfig,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything needed to execute one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub strategy: Strategy,
    pub range: DateRange,
    pub initial_capital: Decimal,
    pub price_model: PriceModel,
    pub fill_model: FillModel,
    pub mode: RunMode,
    pub blacklist: Blacklist,
    /// Scenario label carried into batch reports.
    pub label: String,
}

/// Output of one run. Positions and day records are only populated for
/// COMPLETED runs; a FAILED run carries its error and no partial rows.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: SimulationRun,
    pub positions: Vec<Position>,
    pub days: Vec<DayRecord>,
    pub cycles: Vec<CycleSummary>,
}

/// The simulation engine.
pub struct CycleSimulator {
    resolver: PriceResolver,
    plan_builder: Arc<HistoricalPlanBuilder>,
}

impl CycleSimulator {
    pub fn new(market: Arc<dyn MarketDataProvider>, plan_builder: Arc<HistoricalPlanBuilder>) -> Self {
        Self {
            resolver: PriceResolver::new(market),
            plan_builder,
        }
    }

    /// Run one simulation to a terminal status. Infrastructure errors
    /// surface as a FAILED run, not as an `Err`; the returned report is
    /// always in a terminal state.
    pub async fn run(&self, request: SimulationRequest) -> Result<RunReport> {
        let mut run = SimulationRun::new(
            request.strategy.id,
            request.label.clone(),
            request.range,
            request.initial_capital,
        );
        info!(
            run_id = %run.id,
            strategy = %request.strategy.name,
            start = %request.range.start,
            end = %request.range.end,
            "Starting simulation"
        );

        match self.run_inner(&request).await {
            Ok(outcome) => {
                info!(
                    run_id = %run.id,
                    roi_pct = outcome.summary.roi_pct,
                    realized = %outcome.summary.realized_profit,
                    days = outcome.days.len(),
                    "Simulation completed"
                );
                run.complete(outcome.summary)?;
                Ok(RunReport {
                    run,
                    positions: outcome.positions,
                    days: outcome.days,
                    cycles: outcome.cycles,
                })
            }
            Err(err) => {
                warn!(run_id = %run.id, error = %err, "Simulation failed");
                run.fail(err.to_string())?;
                Ok(RunReport {
                    run,
                    positions: Vec::new(),
                    days: Vec::new(),
                    cycles: Vec::new(),
                })
            }
        }
    }

    async fn run_inner(&self, request: &SimulationRequest) -> Result<InnerOutcome> {
        let config = &request.strategy.config;
        let reserve_target = match request.mode {
            RunMode::MultiCycle => request.initial_capital * dec(config.reserve_cash_pct),
            RunMode::SingleBuy => Decimal::ZERO,
        };

        let mut state = SimState::new(request.initial_capital);

        // Initial purchase at the start of the range.
        let investable = state.cash - reserve_target;
        if investable > Decimal::ZERO {
            let outcome = self
                .plan_builder
                .build_plan(
                    config,
                    request.range.start,
                    request.price_model,
                    investable,
                    &HashMap::new(),
                    InventoryMode::Ignore,
                    &request.blacklist,
                )
                .await?;
            self.execute_packages(&mut state, &outcome, reserve_target, usize::MAX)?;
        }

        let mut grid = self
            .fetch_pairs_grid(state.pair_keys(), request.range)
            .await?;

        let cycle_len = config.cycle_length_days.max(1);
        let mut cycle_start = request.range.start;
        let mut days_in_cycle = 0u32;

        for date in request.range.days() {
            self.process_day(&mut state, &grid, date, config, &request.fill_model, request.price_model);

            if request.mode == RunMode::MultiCycle && date < request.range.end {
                let new_pairs = self.maybe_rebuy(&mut state, request, date, reserve_target).await?;
                if !new_pairs.is_empty() {
                    let remaining = DateRange::new(date, request.range.end)?;
                    let extension = self.fetch_pairs_grid(new_pairs, remaining).await?;
                    grid.merge(extension);
                }
            }

            state.close_day(date, config);

            days_in_cycle += 1;
            let terminal = request.mode == RunMode::SingleBuy && state.all_terminal();
            if days_in_cycle == cycle_len || date == request.range.end || terminal {
                state.flush_cycle(DateRange::new(cycle_start, date)?);
                if let Some(next) = date.succ_opt() {
                    cycle_start = next;
                }
                days_in_cycle = 0;
            }
            if terminal {
                debug!(date = %date, "Every position sold out or red, ending single-buy run early");
                break;
            }
        }

        Ok(state.into_outcome(request.initial_capital))
    }

    /// Listing/reprice and selling for every active position.
    fn process_day(
        &self,
        state: &mut SimState,
        grid: &ObservationGrid,
        date: NaiveDate,
        config: &StrategyConfig,
        fill_model: &FillModel,
        price_model: PriceModel,
    ) {
        let mut positions = std::mem::take(&mut state.positions);

        for (&(destination, item), position) in positions.iter_mut() {
            if !position.is_active() {
                continue;
            }
            // No observation today means no trading signal for the pair.
            let Some(obs) = grid.on(destination, item, date) else {
                continue;
            };
            let market_price = obs.price(price_model);
            if market_price <= Decimal::ZERO {
                continue;
            }

            match position.listed_price {
                None => {
                    let list_price = next_cheaper_tick(market_price);
                    if list_price <= Decimal::ZERO {
                        continue;
                    }
                    let order_value = list_price * Decimal::from(position.units_remaining());
                    let fee = listing_fee(order_value, config.broker_fee_pct);
                    if fee > state.cash {
                        debug!(destination, item, fee = %fee, cash = %state.cash, "Cannot afford listing fee, skipping today");
                    } else {
                        state.cash -= fee;
                        state.add_broker_fee(fee);
                        position.charge_fee(fee);
                        position.listed_price = Some(list_price);
                    }
                }
                Some(listed) if market_price < listed => {
                    let candidate = next_cheaper_tick(market_price);
                    let net_unit = net_sell(candidate, config.sales_tax_pct, config.broker_fee_pct);
                    if margin_pct(net_unit, position.avg_unit_cost) <= config.red_margin_floor {
                        debug!(destination, item, candidate = %candidate, "Reprice margin at or below red floor, position goes red");
                        position.mark_red();
                        continue;
                    }
                    let order_value = candidate * Decimal::from(position.units_remaining());
                    let fee = relist_fee(order_value, config.relist_fee_pct, config.reprices_per_day);
                    if fee > state.cash {
                        debug!(destination, item, fee = %fee, "Cannot afford relist fee, keeping old price today");
                    } else {
                        state.cash -= fee;
                        state.add_relist_fee(fee);
                        position.charge_fee(fee);
                        position.listed_price = Some(candidate);
                    }
                }
                Some(_) => {}
            }

            // Selling happens only against a live listing.
            let Some(listed) = position.listed_price else {
                continue;
            };
            let share = fill_model.share_for(destination, item);
            let cap = (share * obs.volume as f64).floor() as u64;
            let units = cap.min(position.units_remaining());
            if units == 0 {
                continue;
            }

            let net_unit = net_sell(listed, config.sales_tax_pct, config.broker_fee_pct);
            let cogs = position.avg_unit_cost * Decimal::from(units);
            let proceeds = position.record_sale(units, net_unit);
            state.cash += proceeds;
            state.add_sale(proceeds, cogs);
        }

        state.positions = positions;
    }

    /// Fire the rebuy trigger if cash has accumulated past the
    /// threshold. Returns any pairs created by the purchase so the
    /// caller can extend its observation grid.
    async fn maybe_rebuy(
        &self,
        state: &mut SimState,
        request: &SimulationRequest,
        date: NaiveDate,
        reserve_target: Decimal,
    ) -> Result<Vec<(LocationId, ItemId)>> {
        let config = &request.strategy.config;
        let total = state.cash + state.inventory_cost();
        if total <= Decimal::ZERO {
            return Ok(Vec::new());
        }
        let cash_ratio = (state.cash / total).to_f64().unwrap_or(0.0);
        if cash_ratio < config.rebuy_trigger_cash_pct {
            return Ok(Vec::new());
        }
        let investable = state.cash - reserve_target;
        if investable <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let existing = state.held_units();
        let outcome = self
            .plan_builder
            .build_plan(
                config,
                date,
                request.price_model,
                investable,
                &existing,
                InventoryMode::TopOff,
                &request.blacklist,
            )
            .await?;
        if outcome.is_empty() {
            return Ok(Vec::new());
        }

        debug!(date = %date, cash_ratio, packages = outcome.plan.packages.len(), "Rebuy triggered");
        self.execute_packages(state, &outcome, reserve_target, config.max_packages_per_rebuy)
    }

    /// Execute packages greedily in plan order. Each package is
    /// all-or-nothing; the pass stops at the first package that would
    /// break the cash reserve.
    fn execute_packages(
        &self,
        state: &mut SimState,
        outcome: &PlanOutcome,
        reserve_target: Decimal,
        max_packages: usize,
    ) -> Result<Vec<(LocationId, ItemId)>> {
        let mut new_pairs = Vec::new();
        let mut executed = 0usize;

        for package in &outcome.plan.packages {
            if executed >= max_packages {
                break;
            }

            // Price every line from the guaranteed buy-price map so cash
            // movements and cost basis reconcile exactly.
            let mut lines = Vec::with_capacity(package.items.len());
            let mut goods = Decimal::ZERO;
            for line in &package.items {
                let price = outcome
                    .buy_price_by_item
                    .get(&line.item)
                    .copied()
                    .ok_or(Error::MissingBuyPrice {
                        item: line.item,
                        destination: package.destination,
                    })?;
                goods += price * Decimal::from(line.units);
                lines.push((line.item, line.units, price));
            }

            let cost = goods + package.shipping;
            if state.cash - cost < reserve_target {
                debug!(destination = package.destination, cost = %cost, cash = %state.cash, "Next package unaffordable, stopping purchase pass");
                break;
            }

            for (item, units, price) in lines {
                let key = (package.destination, item);
                match state.positions.get_mut(&key) {
                    Some(position) => position.add_units(units, price),
                    None => {
                        state
                            .positions
                            .insert(key, Position::new(package.destination, item, units, price));
                        new_pairs.push(key);
                    }
                }
            }

            state.cash -= cost;
            state.add_purchase(goods, package.shipping);
            executed += 1;
        }

        Ok(new_pairs)
    }

    async fn fetch_pairs_grid(
        &self,
        pairs: Vec<(LocationId, ItemId)>,
        range: DateRange,
    ) -> Result<ObservationGrid> {
        if pairs.is_empty() {
            return Ok(ObservationGrid::default());
        }
        let mut locations: Vec<LocationId> = pairs.iter().map(|p| p.0).collect();
        locations.sort_unstable();
        locations.dedup();
        let mut items: Vec<ItemId> = pairs.iter().map(|p| p.1).collect();
        items.sort_unstable();
        items.dedup();

        self.resolver.resolve_many(&locations, &items, range).await
    }
}

/// Cash-basis accounting accumulators.
#[derive(Debug, Clone, Default)]
struct CashLedger {
    sales_net: Decimal,
    cost_of_goods_sold: Decimal,
    spend: Decimal,
    shipping: Decimal,
    broker_fees: Decimal,
    relist_fees: Decimal,
}

impl CashLedger {
    /// Cash-basis profit, deliberately excluding unrealized mark.
    fn profit(&self) -> Decimal {
        self.sales_net - self.cost_of_goods_sold - self.shipping - self.broker_fees
            - self.relist_fees
    }
}

/// Mutable state of one run in flight.
struct SimState {
    cash: Decimal,
    positions: BTreeMap<(LocationId, ItemId), Position>,
    days: Vec<DayRecord>,
    cycles: Vec<CycleSummary>,
    totals: CashLedger,
    cycle_acc: CashLedger,
    peak_nav: Decimal,
    max_drawdown: f64,
}

struct InnerOutcome {
    summary: RunSummary,
    positions: Vec<Position>,
    days: Vec<DayRecord>,
    cycles: Vec<CycleSummary>,
}

impl SimState {
    fn new(initial_capital: Decimal) -> Self {
        Self {
            cash: initial_capital,
            positions: BTreeMap::new(),
            days: Vec::new(),
            cycles: Vec::new(),
            totals: CashLedger::default(),
            cycle_acc: CashLedger::default(),
            peak_nav: initial_capital,
            max_drawdown: 0.0,
        }
    }

    fn pair_keys(&self) -> Vec<(LocationId, ItemId)> {
        self.positions.keys().copied().collect()
    }

    fn inventory_cost(&self) -> Decimal {
        self.positions.values().map(|p| p.cost_basis_remaining()).sum()
    }

    fn held_units(&self) -> HashMap<(LocationId, ItemId), u64> {
        self.positions
            .iter()
            .filter(|(_, p)| p.units_remaining() > 0)
            .map(|(key, p)| (*key, p.units_remaining()))
            .collect()
    }

    fn all_terminal(&self) -> bool {
        self.positions.values().all(|p| !p.is_active())
    }

    fn add_sale(&mut self, proceeds: Decimal, cogs: Decimal) {
        self.totals.sales_net += proceeds;
        self.totals.cost_of_goods_sold += cogs;
        self.cycle_acc.sales_net += proceeds;
        self.cycle_acc.cost_of_goods_sold += cogs;
    }

    fn add_broker_fee(&mut self, fee: Decimal) {
        self.totals.broker_fees += fee;
        self.cycle_acc.broker_fees += fee;
    }

    fn add_relist_fee(&mut self, fee: Decimal) {
        self.totals.relist_fees += fee;
        self.cycle_acc.relist_fees += fee;
    }

    fn add_purchase(&mut self, goods: Decimal, shipping: Decimal) {
        self.totals.spend += goods;
        self.totals.shipping += shipping;
        self.cycle_acc.spend += goods;
        self.cycle_acc.shipping += shipping;
    }

    /// End-of-day mark-to-market, NAV, and drawdown tracking.
    fn close_day(&mut self, date: NaiveDate, config: &StrategyConfig) {
        let mut inventory_cost = Decimal::ZERO;
        let mut inventory_mark = Decimal::ZERO;

        for position in self.positions.values() {
            let remaining = position.units_remaining();
            if remaining == 0 {
                continue;
            }
            inventory_cost += position.cost_basis_remaining();
            // Lower of cost or listed net sell value. Impairment from a
            // collapsing listing flows into NAV immediately; profit on
            // healthy inventory is only recognized as units actually fill.
            let unit_mark = match position.listed_price {
                Some(listed) => net_sell(listed, config.sales_tax_pct, config.broker_fee_pct)
                    .min(position.avg_unit_cost),
                None => position.avg_unit_cost,
            };
            inventory_mark += unit_mark * Decimal::from(remaining);
        }

        let nav = self.cash + inventory_mark;
        if nav > self.peak_nav {
            self.peak_nav = nav;
        }
        if self.peak_nav > Decimal::ZERO {
            let drawdown = ((self.peak_nav - nav) / self.peak_nav)
                .to_f64()
                .unwrap_or(0.0);
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }

        self.days.push(DayRecord {
            date,
            cash: self.cash,
            inventory_cost,
            inventory_mark,
            realized_profit: self.totals.profit(),
            unrealized_profit: inventory_mark - inventory_cost,
            nav,
        });
    }

    /// Close the current cycle window and reset its accumulators.
    fn flush_cycle(&mut self, range: DateRange) {
        let acc = std::mem::take(&mut self.cycle_acc);
        let profit = acc.profit();
        self.cycles.push(CycleSummary {
            index: self.cycles.len() as u32,
            range,
            sales_net: acc.sales_net,
            cost_of_goods_sold: acc.cost_of_goods_sold,
            shipping: acc.shipping,
            broker_fees: acc.broker_fees,
            relist_fees: acc.relist_fees,
            profit,
        });
    }

    fn into_outcome(self, initial_capital: Decimal) -> InnerOutcome {
        let realized = self.totals.profit();
        let roi_pct = if initial_capital > Decimal::ZERO {
            (realized / initial_capital).to_f64().unwrap_or(0.0) * 100.0
        } else {
            0.0
        };
        let final_nav = self.days.last().map(|d| d.nav).unwrap_or(initial_capital);

        InnerOutcome {
            summary: RunSummary {
                total_spend: self.totals.spend,
                total_shipping: self.totals.shipping,
                broker_fees: self.totals.broker_fees,
                relist_fees: self.totals.relist_fees,
                realized_profit: realized,
                roi_pct,
                max_drawdown_pct: self.max_drawdown * 100.0,
                day_count: self.days.len() as u32,
                final_nav,
            },
            positions: self.positions.into_values().collect(),
            days: self.days,
            cycles: self.cycles,
        }
    }
}
