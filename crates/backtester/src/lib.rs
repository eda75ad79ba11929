//! Backtester
//!
//! Historical simulation engine for hauling/trading strategies.
//!
//! # Components
//!
//! - **Price Resolver**: as-of lookup of daily market observations
//! - **Liquidity Filter**: coverage/value/trade-count candidate gating
//! - **Historical Plan Builder**: snapshot -> purchase plan, packing
//!   delegated to the external planner
//! - **Capture Calibrator**: empirical per-pair fill rates
//! - **Cycle Simulator**: the day-by-day position lifecycle state machine
//!
//! # Example
//!
//! ```ignore
//! use backtester::{CycleSimulator, SimulationRequest};
//!
//! let simulator = CycleSimulator::new(market, plan_builder);
//! let report = simulator.run(request).await?;
//! println!("ROI: {:.2}%", report.run.summary.unwrap().roi_pct);
//! ```

pub mod calibration;
pub mod liquidity;
pub mod planner;
pub mod resolver;
pub mod simulator;

// Re-exports
pub use calibration::{CaptureCalibrator, CaptureShares};
pub use liquidity::{filter_candidates, LiquidityThresholds};
pub use planner::{direct_fetcher, HistoricalPlanBuilder, PlanOutcome, SnapshotFetcher};
pub use resolver::{ObservationGrid, PriceResolver};
pub use simulator::{CycleSimulator, RunReport, SimulationRequest};
