//! Market Core
//!
//! Shared types, fee math, environment configuration, and external
//! provider interfaces for the Trade Lab backtesting workspace.
//!
//! Everything in this crate is pure data or pure functions; the
//! simulation engine lives in the `backtester` crate and batch execution
//! in `orchestrator`.

pub mod config;
pub mod error;
pub mod fees;
pub mod provider;
pub mod types;

// Re-exports
pub use config::LabConfig;
pub use error::{Error, Result};
pub use provider::{MarketDataProvider, PackagePlanner, SalesHistory};
pub use types::blacklist::Blacklist;
pub use types::market::{
    CandidateItem, CandidateSet, DestinationCandidates, LiquidityCandidate, LiquiditySnapshot,
    PackageItem, PackingConstraints, PlanResult, PurchasePackage, SaleRecord,
};
pub use types::observation::{PriceModel, PriceObservation};
pub use types::position::Position;
pub use types::run::{CycleSummary, DayRecord, RunStatus, RunSummary, SimulationRun};
pub use types::strategy::{FillModel, InventoryMode, RunMode, Strategy, StrategyConfig};
pub use types::{DateRange, ItemId, LocationId};
