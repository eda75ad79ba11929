//! Simulation run lifecycle, daily records, and summaries.

use crate::types::DateRange;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run lifecycle state. Transitions are one-directional:
/// RUNNING -> COMPLETED or RUNNING -> FAILED, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One execution of one strategy over one date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: Uuid,
    pub strategy_id: Uuid,
    /// Human-readable scenario label for batch reports.
    pub label: String,
    pub range: DateRange,
    pub initial_capital: Decimal,
    pub status: RunStatus,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SimulationRun {
    pub fn new(
        strategy_id: Uuid,
        label: impl Into<String>,
        range: DateRange,
        initial_capital: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_id,
            label: label.into(),
            range,
            initial_capital,
            status: RunStatus::Running,
            summary: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Transition RUNNING -> COMPLETED. Any other source state is an error.
    pub fn complete(&mut self, summary: RunSummary) -> Result<()> {
        self.transition(RunStatus::Completed)?;
        self.summary = Some(summary);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Transition RUNNING -> FAILED, capturing the error message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(RunStatus::Failed)?;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, to: RunStatus) -> Result<()> {
        if self.status != RunStatus::Running {
            return Err(Error::InvalidRunTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Aggregate accounting for a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_spend: Decimal,
    pub total_shipping: Decimal,
    pub broker_fees: Decimal,
    pub relist_fees: Decimal,
    /// Cash-basis profit: sales net of fees minus cost of goods sold
    /// minus shipping. Excludes unrealized mark.
    pub realized_profit: Decimal,
    pub roi_pct: f64,
    pub max_drawdown_pct: f64,
    pub day_count: u32,
    pub final_nav: Decimal,
}

/// End-of-day accounting snapshot. Append-only, one per simulated date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub inventory_cost: Decimal,
    pub inventory_mark: Decimal,
    /// Cumulative cash-basis realized profit through this day.
    pub realized_profit: Decimal,
    /// `inventory_mark - inventory_cost`.
    pub unrealized_profit: Decimal,
    /// `cash + inventory_mark`.
    pub nav: Decimal,
}

/// Cash-basis accounting for one cycle window within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub index: u32,
    pub range: DateRange,
    pub sales_net: Decimal,
    pub cost_of_goods_sold: Decimal,
    pub shipping: Decimal,
    pub broker_fees: Decimal,
    pub relist_fees: Decimal,
    /// `sales_net - cost_of_goods_sold - shipping - broker_fees - relist_fees`.
    pub profit: Decimal,
}
