//! Daily aggregated order-book observations.

use crate::types::{ItemId, LocationId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which daily price statistic a simulation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceModel {
    High,
    Avg,
    Low,
}

impl std::fmt::Display for PriceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceModel::High => write!(f, "high"),
            PriceModel::Avg => write!(f, "avg"),
            PriceModel::Low => write!(f, "low"),
        }
    }
}

/// One day of aggregated market statistics for an (item, location) pair.
///
/// Externally owned and immutable; the engine only reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub location: LocationId,
    pub item: ItemId,
    pub date: NaiveDate,
    pub high: Decimal,
    pub low: Decimal,
    pub avg: Decimal,
    /// Units traded across the whole market that day.
    pub volume: u64,
}

impl PriceObservation {
    /// Select the price statistic for the given model.
    pub fn price(&self, model: PriceModel) -> Decimal {
        match model {
            PriceModel::High => self.high,
            PriceModel::Avg => self.avg,
            PriceModel::Low => self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_selection() {
        let obs = PriceObservation {
            location: 1,
            item: 34,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            high: Decimal::new(110, 0),
            low: Decimal::new(90, 0),
            avg: Decimal::new(100, 0),
            volume: 1000,
        };

        assert_eq!(obs.price(PriceModel::High), Decimal::new(110, 0));
        assert_eq!(obs.price(PriceModel::Avg), Decimal::new(100, 0));
        assert_eq!(obs.price(PriceModel::Low), Decimal::new(90, 0));
    }
}
