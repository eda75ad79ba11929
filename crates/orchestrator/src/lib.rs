//! Orchestrator
//!
//! Runs batches of simulations under bounded concurrency and reduces
//! their outputs into ranked, statistically robust reports.
//!
//! # Batch modes
//!
//! - **Walk-forward**: a fixed test window slides across a date range;
//!   percentile statistics and recurring-loser suggestions come out.
//! - **Lab sweep**: cross-product of price models, sell-share
//!   assumptions, and strategies; robustness-first ranking.
//! - **Robustness sweep**: single-buy runs across many start dates;
//!   tail statistics and cross-strategy repeat offenders.
//!
//! Workers share nothing mutable except a read-through cache of raw
//! liquidity snapshots with fetch-or-compute-once semantics.

pub mod cache;
pub mod orchestrator;
pub mod pool;
pub mod robustness;
pub mod stats;
pub mod sweep;
pub mod walk_forward;

// Re-exports
pub use cache::SnapshotCache;
pub use orchestrator::ScenarioOrchestrator;
pub use pool::run_bounded;
pub use robustness::{
    RepeatOffender, RobustnessConfig, RobustnessReport, RobustnessVariant, StrategyTail, TailStats,
};
pub use sweep::{ScenarioKey, StrategyRank, SweepCell, SweepConfig, SweepReport, FAILED_SCORE};
pub use walk_forward::{
    AggregateStats, BlacklistSuggestion, WalkForwardConfig, WalkForwardReport, WindowOutcome,
};
