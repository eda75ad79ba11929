//! Lab sweep: price models x sell shares x strategies, ranked
//! robustness-first.

use crate::orchestrator::ScenarioOrchestrator;
use crate::stats::decimal_to_f64;
use crate::walk_forward::WalkForwardConfig;
use anyhow::Result;
use market_core::{Blacklist, FillModel, PriceModel, Strategy};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Sentinel for cells with no completed runs: finite, serializable,
/// sorts below any real score.
pub const FAILED_SCORE: f64 = -1.0e9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub price_models: Vec<PriceModel>,
    /// Sell-share assumptions, any order; the smallest is the
    /// conservative one used for ranking.
    pub sell_shares: Vec<f64>,
    pub walk: WalkForwardConfig,
}

/// One (price model, sell share) scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub price_model: PriceModel,
    pub sell_share: f64,
}

/// One strategy evaluated under one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepCell {
    pub strategy_id: Uuid,
    pub strategy_name: String,
    pub scenario: ScenarioKey,
    pub roi_median: f64,
    pub worst_drawdown: f64,
    pub win_rate: f64,
    pub relist_fees_median: f64,
    pub completed: usize,
    pub failed: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRank {
    pub strategy_id: Uuid,
    pub strategy_name: String,
    /// Worst score across price models at the lowest sell share.
    pub conservative_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub cells: Vec<SweepCell>,
    /// Best conservative score first.
    pub ranking: Vec<StrategyRank>,
}

/// Penalize drawdown and relist-fee churn against median ROI.
pub fn score_cell(
    roi_median: f64,
    worst_drawdown: f64,
    relist_fees_median: f64,
    capital: f64,
) -> f64 {
    let fee_drag = if capital > 0.0 {
        relist_fees_median / capital * 100.0
    } else {
        0.0
    };
    roi_median - 0.15 * worst_drawdown - 0.05 * fee_drag
}

impl ScenarioOrchestrator {
    /// Cross-product sweep, each cell evaluated by the walk-forward
    /// procedure. Strategies are ranked by their score under the most
    /// conservative sell-share assumption, not by best-case results.
    pub async fn lab_sweep(
        &self,
        strategies: &[Strategy],
        config: &SweepConfig,
    ) -> Result<SweepReport> {
        let capital = decimal_to_f64(config.walk.initial_capital);
        let mut cells = Vec::new();

        for strategy in strategies {
            for &price_model in &config.price_models {
                for &sell_share in &config.sell_shares {
                    let report = self
                        .walk_forward(
                            strategy,
                            price_model,
                            FillModel::VolumeShare { share: sell_share },
                            Blacklist::default(),
                            &config.walk,
                        )
                        .await?;

                    let stats = &report.stats;
                    let score = if stats.completed == 0 {
                        FAILED_SCORE
                    } else {
                        score_cell(
                            stats.roi_median,
                            stats.worst_drawdown,
                            stats.relist_fees_median,
                            capital,
                        )
                    };

                    cells.push(SweepCell {
                        strategy_id: strategy.id,
                        strategy_name: strategy.name.clone(),
                        scenario: ScenarioKey {
                            price_model,
                            sell_share,
                        },
                        roi_median: stats.roi_median,
                        worst_drawdown: stats.worst_drawdown,
                        win_rate: stats.win_rate,
                        relist_fees_median: stats.relist_fees_median,
                        completed: stats.completed,
                        failed: stats.failed,
                        score,
                    });
                }
            }
        }

        let ranking = rank(strategies, &cells, &config.sell_shares);
        info!(
            strategies = strategies.len(),
            cells = cells.len(),
            "Lab sweep finished"
        );

        Ok(SweepReport { cells, ranking })
    }
}

fn rank(strategies: &[Strategy], cells: &[SweepCell], sell_shares: &[f64]) -> Vec<StrategyRank> {
    let conservative_share = sell_shares.iter().cloned().fold(f64::INFINITY, f64::min);

    let mut ranking: Vec<StrategyRank> = strategies
        .iter()
        .map(|strategy| {
            let conservative_score = cells
                .iter()
                .filter(|c| c.strategy_id == strategy.id && c.scenario.sell_share == conservative_share)
                .map(|c| c.score)
                .fold(f64::INFINITY, f64::min);
            let conservative_score = if conservative_score.is_finite() {
                conservative_score
            } else {
                FAILED_SCORE
            };
            StrategyRank {
                strategy_id: strategy.id,
                strategy_name: strategy.name.clone(),
                conservative_score,
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.conservative_score
            .partial_cmp(&a.conservative_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranking
}
