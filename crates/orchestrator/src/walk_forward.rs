//! Walk-forward evaluation: a fixed test window slides across a range.

use crate::orchestrator::ScenarioOrchestrator;
use crate::stats::{decimal_to_f64, median, percentile, win_rate};
use anyhow::{bail, Result};
use backtester::SimulationRequest;
use chrono::Days;
use market_core::{
    Blacklist, DateRange, FillModel, ItemId, LocationId, PriceModel, RunMode, RunStatus,
    SimulationRun, Strategy,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    pub range: DateRange,
    pub window_days: u32,
    pub step_days: u32,
    pub initial_capital: Decimal,
}

/// One window's run plus the loss-making pairs it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowOutcome {
    pub window: DateRange,
    pub run: SimulationRun,
    /// `(destination, item, realized_loss)` for pairs that lost money.
    pub losers: Vec<(LocationId, ItemId, Decimal)>,
}

/// Percentile statistics across the COMPLETED windows of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub roi_median: f64,
    pub roi_p10: f64,
    pub roi_p90: f64,
    pub profit_median: f64,
    pub profit_p10: f64,
    pub profit_p90: f64,
    pub drawdown_median: f64,
    pub worst_drawdown: f64,
    pub relist_fees_median: f64,
    pub win_rate: f64,
    pub completed: usize,
    pub failed: usize,
}

/// A pair that lost money in at least two windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistSuggestion {
    pub item: ItemId,
    pub destination: LocationId,
    pub loser_runs: usize,
    pub total_loss: Decimal,
    pub strategies: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub strategy_id: Uuid,
    pub windows: Vec<WindowOutcome>,
    pub stats: AggregateStats,
    pub blacklist_suggestions: Vec<BlacklistSuggestion>,
}

/// Window start slides by `step_days`; every window is full-length.
pub fn windows(config: &WalkForwardConfig) -> Vec<DateRange> {
    let mut out = Vec::new();
    if config.window_days == 0 {
        return out;
    }
    let step = config.step_days.max(1) as u64;
    let span = Days::new(config.window_days as u64 - 1);

    let mut start = config.range.start;
    loop {
        let Some(end) = start.checked_add_days(span) else {
            break;
        };
        if end > config.range.end {
            break;
        }
        // Full windows only; both bounds were just validated.
        if let Ok(window) = DateRange::new(start, end) {
            out.push(window);
        }
        let Some(next) = start.checked_add_days(Days::new(step)) else {
            break;
        };
        start = next;
    }
    out
}

impl ScenarioOrchestrator {
    /// Run one strategy across every window and aggregate the results.
    pub async fn walk_forward(
        &self,
        strategy: &Strategy,
        price_model: PriceModel,
        fill_model: FillModel,
        blacklist: Blacklist,
        config: &WalkForwardConfig,
    ) -> Result<WalkForwardReport> {
        let windows = windows(config);
        if windows.is_empty() {
            bail!(
                "walk-forward range {}..{} does not fit a {}-day window",
                config.range.start,
                config.range.end,
                config.window_days
            );
        }

        let requests: Vec<SimulationRequest> = windows
            .iter()
            .map(|window| SimulationRequest {
                strategy: strategy.clone(),
                range: *window,
                initial_capital: config.initial_capital,
                price_model,
                fill_model: fill_model.clone(),
                mode: RunMode::MultiCycle,
                blacklist: blacklist.clone(),
                label: format!("wf {}..{}", window.start, window.end),
            })
            .collect();

        let reports = self.run_many(requests).await;

        let outcomes: Vec<WindowOutcome> = reports
            .into_iter()
            .zip(windows)
            .map(|(report, window)| WindowOutcome {
                window,
                losers: report
                    .positions
                    .iter()
                    .filter(|p| p.realized_profit < Decimal::ZERO)
                    .map(|p| (p.destination, p.item, p.realized_profit))
                    .collect(),
                run: report.run,
            })
            .collect();

        let stats = aggregate(&outcomes);
        let blacklist_suggestions = suggest_blacklist(strategy.id, &outcomes);

        info!(
            strategy = %strategy.name,
            windows = outcomes.len(),
            completed = stats.completed,
            failed = stats.failed,
            roi_median = stats.roi_median,
            "Walk-forward finished"
        );

        Ok(WalkForwardReport {
            strategy_id: strategy.id,
            windows: outcomes,
            stats,
            blacklist_suggestions,
        })
    }
}

/// Aggregate statistics over COMPLETED windows only.
pub fn aggregate(outcomes: &[WindowOutcome]) -> AggregateStats {
    let mut rois = Vec::new();
    let mut profits = Vec::new();
    let mut drawdowns = Vec::new();
    let mut relist_fees = Vec::new();
    let mut failed = 0usize;

    for outcome in outcomes {
        match (&outcome.run.status, &outcome.run.summary) {
            (RunStatus::Completed, Some(summary)) => {
                rois.push(summary.roi_pct);
                profits.push(decimal_to_f64(summary.realized_profit));
                drawdowns.push(summary.max_drawdown_pct);
                relist_fees.push(decimal_to_f64(summary.relist_fees));
            }
            _ => failed += 1,
        }
    }

    AggregateStats {
        roi_median: median(&rois),
        roi_p10: percentile(&rois, 0.1),
        roi_p90: percentile(&rois, 0.9),
        profit_median: median(&profits),
        profit_p10: percentile(&profits, 0.1),
        profit_p90: percentile(&profits, 0.9),
        drawdown_median: median(&drawdowns),
        worst_drawdown: drawdowns.iter().cloned().fold(0.0, f64::max),
        relist_fees_median: median(&relist_fees),
        win_rate: win_rate(&rois),
        completed: rois.len(),
        failed,
    }
}

/// Pairs with negative realized profit in at least two windows.
fn suggest_blacklist(strategy_id: Uuid, outcomes: &[WindowOutcome]) -> Vec<BlacklistSuggestion> {
    let mut by_pair: BTreeMap<(LocationId, ItemId), (usize, Decimal)> = BTreeMap::new();
    for outcome in outcomes {
        for (destination, item, loss) in &outcome.losers {
            let entry = by_pair.entry((*destination, *item)).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += *loss;
        }
    }

    let mut suggestions: Vec<BlacklistSuggestion> = by_pair
        .into_iter()
        .filter(|(_, (runs, _))| *runs >= 2)
        .map(|((destination, item), (loser_runs, total_loss))| BlacklistSuggestion {
            item,
            destination,
            loser_runs,
            total_loss,
            strategies: vec![strategy_id],
        })
        .collect();

    // Deepest losses first.
    suggestions.sort_by(|a, b| a.total_loss.cmp(&b.total_loss));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(start: NaiveDate, end: NaiveDate, window_days: u32, step_days: u32) -> WalkForwardConfig {
        WalkForwardConfig {
            range: DateRange::new(start, end).unwrap(),
            window_days,
            step_days,
            initial_capital: Decimal::from(1_000_000i64),
        }
    }

    #[test]
    fn test_windows_non_overlapping() {
        let cfg = config(date(2024, 1, 1), date(2024, 1, 21), 7, 7);
        let out = windows(&cfg);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap());
        assert_eq!(out[1], DateRange::new(date(2024, 1, 8), date(2024, 1, 14)).unwrap());
        assert_eq!(out[2], DateRange::new(date(2024, 1, 15), date(2024, 1, 21)).unwrap());
    }

    #[test]
    fn test_windows_with_stride_overlap() {
        let cfg = config(date(2024, 1, 1), date(2024, 1, 10), 7, 2);
        let out = windows(&cfg);
        // Starts: 1, 3 -> windows end 7, 9; a start of 5 ends on the 11th.
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_windows_too_short_range() {
        let cfg = config(date(2024, 1, 1), date(2024, 1, 3), 7, 7);
        assert!(windows(&cfg).is_empty());
    }

    #[test]
    fn test_suggest_blacklist_requires_two_windows() {
        let strategy_id = Uuid::new_v4();
        let window = DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        let run = SimulationRun::new(strategy_id, "w", window, Decimal::ONE);

        let outcome = |losers: Vec<(LocationId, ItemId, Decimal)>| WindowOutcome {
            window,
            run: run.clone(),
            losers,
        };

        let outcomes = vec![
            outcome(vec![(20, 34, Decimal::new(-100, 0)), (20, 35, Decimal::new(-50, 0))]),
            outcome(vec![(20, 34, Decimal::new(-200, 0))]),
            outcome(vec![]),
        ];

        let suggestions = suggest_blacklist(strategy_id, &outcomes);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].item, 34);
        assert_eq!(suggestions[0].loser_runs, 2);
        assert_eq!(suggestions[0].total_loss, Decimal::new(-300, 0));
    }
}
