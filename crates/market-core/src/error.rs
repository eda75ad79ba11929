//! Error types for the Trade Lab workspace.

use crate::types::{ItemId, LocationId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A planned item has no resolvable buy price. This is an
    /// internal-consistency violation and aborts the run.
    #[error("no buy price for planned item {item} at destination {destination}")]
    MissingBuyPrice { item: ItemId, destination: LocationId },

    #[error("market data provider error: {0}")]
    Provider(String),

    #[error("package planner error: {0}")]
    Planner(String),

    #[error("invalid run status transition: {from} -> {to}")]
    InvalidRunTransition { from: String, to: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("date range is empty or inverted")]
    EmptyDateRange,
}

pub type Result<T> = std::result::Result<T, Error>;
