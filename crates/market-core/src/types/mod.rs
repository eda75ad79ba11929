//! Core identifier and date-range types shared across the workspace.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub mod blacklist;
pub mod market;
pub mod observation;
pub mod position;
pub mod run;
pub mod strategy;

/// Numeric item type identifier.
pub type ItemId = u64;

/// Numeric location (station/hub) identifier.
pub type LocationId = u64;

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        if start > end {
            return Err(crate::Error::EmptyDateRange);
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, inclusive of both endpoints.
    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Iterate every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let count = self.day_count() as u64;
        (0..count).filter_map(|offset| self.start.checked_add_days(Days::new(offset)))
    }
}
