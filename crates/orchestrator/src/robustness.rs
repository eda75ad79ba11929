//! Robustness sweep: single-buy runs across many start dates.

use crate::orchestrator::ScenarioOrchestrator;
use crate::stats::{decimal_to_f64, loss_rate, median, percentile};
use anyhow::{bail, Result};
use backtester::SimulationRequest;
use chrono::{Days, NaiveDate};
use market_core::{
    Blacklist, DateRange, FillModel, ItemId, LocationId, PriceModel, RunMode, RunStatus, Strategy,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RobustnessConfig {
    pub range: DateRange,
    /// Distance between consecutive start dates.
    pub stride_days: u32,
    pub initial_capital: Decimal,
    pub price_model: PriceModel,
    pub fill_model: FillModel,
    /// When set, the sweep also runs with this blacklist applied to
    /// planning so the two variants can be compared.
    pub blacklist: Option<Blacklist>,
}

/// Tail statistics over one strategy's completed runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailStats {
    pub profit_p10: f64,
    pub profit_median: f64,
    pub profit_p90: f64,
    pub loss_rate: f64,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyTail {
    pub strategy_id: Uuid,
    pub strategy_name: String,
    pub stats: TailStats,
}

/// A pair that lost money or went red in at least two runs, across all
/// strategies in the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatOffender {
    pub item: ItemId,
    pub destination: LocationId,
    pub loser_runs: usize,
    pub red_runs: usize,
    pub total_loss: Decimal,
    pub strategies: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessVariant {
    pub per_strategy: Vec<StrategyTail>,
    pub repeat_offenders: Vec<RepeatOffender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub baseline: RobustnessVariant,
    pub with_blacklist: Option<RobustnessVariant>,
}

/// Start dates from the range start, every `stride_days`.
pub fn start_dates(range: DateRange, stride_days: u32) -> Vec<NaiveDate> {
    let stride = stride_days.max(1) as u64;
    let mut out = Vec::new();
    let mut start = range.start;
    while start <= range.end {
        out.push(start);
        let Some(next) = start.checked_add_days(Days::new(stride)) else {
            break;
        };
        start = next;
    }
    out
}

impl ScenarioOrchestrator {
    /// Single-buy tail-risk sweep. Each start date becomes one run per
    /// strategy; run length is data-dependent (a run ends when every
    /// position is sold out or red).
    pub async fn robustness(
        &self,
        strategies: &[Strategy],
        config: &RobustnessConfig,
    ) -> Result<RobustnessReport> {
        let starts = start_dates(config.range, config.stride_days);
        if starts.is_empty() {
            bail!("robustness range contains no start dates");
        }

        let baseline = self
            .robustness_variant(strategies, config, &starts, Blacklist::default())
            .await?;
        let with_blacklist = match &config.blacklist {
            Some(blacklist) => Some(
                self.robustness_variant(strategies, config, &starts, blacklist.clone())
                    .await?,
            ),
            None => None,
        };

        Ok(RobustnessReport {
            baseline,
            with_blacklist,
        })
    }

    async fn robustness_variant(
        &self,
        strategies: &[Strategy],
        config: &RobustnessConfig,
        starts: &[NaiveDate],
        blacklist: Blacklist,
    ) -> Result<RobustnessVariant> {
        let mut per_strategy = Vec::with_capacity(strategies.len());
        let mut offenders: BTreeMap<(LocationId, ItemId), OffenderAcc> = BTreeMap::new();

        for strategy in strategies {
            let requests: Vec<SimulationRequest> = starts
                .iter()
                .filter_map(|&start| DateRange::new(start, config.range.end).ok())
                .map(|range| SimulationRequest {
                    strategy: strategy.clone(),
                    range,
                    initial_capital: config.initial_capital,
                    price_model: config.price_model,
                    fill_model: config.fill_model.clone(),
                    mode: RunMode::SingleBuy,
                    blacklist: blacklist.clone(),
                    label: format!("robustness {}", range.start),
                })
                .collect();

            let reports = self.run_many(requests).await;

            let mut profits = Vec::new();
            let mut failed = 0usize;
            for report in &reports {
                match (&report.run.status, &report.run.summary) {
                    (RunStatus::Completed, Some(summary)) => {
                        profits.push(decimal_to_f64(summary.realized_profit));
                    }
                    _ => failed += 1,
                }

                for position in &report.positions {
                    let losing = position.realized_profit < Decimal::ZERO;
                    if !losing && !position.red {
                        continue;
                    }
                    let acc = offenders
                        .entry((position.destination, position.item))
                        .or_default();
                    // One run can make a pair both a loser and red; it
                    // still counts as a single offending run.
                    acc.offending_runs += 1;
                    if losing {
                        acc.loser_runs += 1;
                        acc.total_loss += position.realized_profit;
                    }
                    if position.red {
                        acc.red_runs += 1;
                    }
                    if !acc.strategies.contains(&strategy.id) {
                        acc.strategies.push(strategy.id);
                    }
                }
            }

            per_strategy.push(StrategyTail {
                strategy_id: strategy.id,
                strategy_name: strategy.name.clone(),
                stats: TailStats {
                    profit_p10: percentile(&profits, 0.1),
                    profit_median: median(&profits),
                    profit_p90: percentile(&profits, 0.9),
                    loss_rate: loss_rate(&profits),
                    completed: profits.len(),
                    failed,
                },
            });

            info!(
                strategy = %strategy.name,
                runs = reports.len(),
                failed,
                "Robustness sweep for strategy finished"
            );
        }

        let mut repeat_offenders: Vec<RepeatOffender> = offenders
            .into_iter()
            .filter(|(_, acc)| acc.offending_runs >= 2)
            .map(|((destination, item), acc)| RepeatOffender {
                item,
                destination,
                loser_runs: acc.loser_runs,
                red_runs: acc.red_runs,
                total_loss: acc.total_loss,
                strategies: acc.strategies,
            })
            .collect();
        repeat_offenders.sort_by(|a, b| a.total_loss.cmp(&b.total_loss));

        Ok(RobustnessVariant {
            per_strategy,
            repeat_offenders,
        })
    }
}

#[derive(Default)]
struct OffenderAcc {
    offending_runs: usize,
    loser_runs: usize,
    red_runs: usize,
    total_loss: Decimal,
    strategies: Vec<Uuid>,
}
