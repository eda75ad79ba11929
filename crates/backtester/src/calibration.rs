//! Empirical capture-share calibration.
//!
//! Derives a per-pair daily fill rate from the ratio of the operator's
//! own past sales to total market volume over a rolling window. Shares
//! are clamped so noisy small samples cannot extrapolate into absurd
//! fill assumptions.

use crate::resolver::PriceResolver;
use anyhow::Result;
use chrono::{Days, NaiveDate};
use market_core::{DateRange, FillModel, ItemId, LocationId, SalesHistory};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper clamp on any calibrated capture share.
pub const MAX_CAPTURE_SHARE: f64 = 0.2;

/// Calibrated per-pair capture rates plus the global fallback.
#[derive(Debug, Clone)]
pub struct CaptureShares {
    pub share_by_pair: HashMap<(LocationId, ItemId), f64>,
    pub fallback_share: f64,
}

impl CaptureShares {
    pub fn share_for(&self, location: LocationId, item: ItemId) -> f64 {
        *self
            .share_by_pair
            .get(&(location, item))
            .unwrap_or(&self.fallback_share)
    }

    pub fn into_fill_model(self) -> FillModel {
        FillModel::CalibratedCapture {
            share_by_pair: self.share_by_pair,
            fallback_share: self.fallback_share,
        }
    }
}

/// Computes capture shares from own-sales history and market volumes.
pub struct CaptureCalibrator {
    resolver: PriceResolver,
    sales: Arc<dyn SalesHistory>,
    /// Used when the window contains no own sales at all, so there is
    /// no global ratio to fall back on.
    default_fallback: f64,
}

impl CaptureCalibrator {
    pub fn new(resolver: PriceResolver, sales: Arc<dyn SalesHistory>, default_fallback: f64) -> Self {
        Self {
            resolver,
            sales,
            default_fallback,
        }
    }

    /// Calibrate over the window of `window_days` ending at `anchor_date`.
    pub async fn calibrate(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        anchor_date: NaiveDate,
        window_days: u32,
    ) -> Result<CaptureShares> {
        let start = anchor_date
            .checked_sub_days(Days::new(window_days.saturating_sub(1) as u64))
            .unwrap_or(anchor_date);
        let range = DateRange::new(start, anchor_date)?;

        let grid = self.resolver.resolve_many(locations, items, range).await?;
        let sales = self.sales.own_sales(locations, items, range).await?;

        let mut own_by_pair: HashMap<(LocationId, ItemId), u64> = HashMap::new();
        for sale in sales {
            if range.contains(sale.date) {
                *own_by_pair.entry((sale.location, sale.item)).or_default() += sale.units;
            }
        }

        let mut share_by_pair = HashMap::new();
        let mut total_own: u64 = 0;
        let mut total_market: u64 = 0;

        for &location in locations {
            for &item in items {
                let market = grid.pair_volume(location, item, range);
                total_market += market;

                let own = own_by_pair.get(&(location, item)).copied().unwrap_or(0);
                total_own += own;

                if own > 0 && market > 0 {
                    let share = (own as f64 / market as f64).clamp(0.0, MAX_CAPTURE_SHARE);
                    share_by_pair.insert((location, item), share);
                    debug!(location, item, own, market, share, "Calibrated pair capture");
                }
            }
        }

        let fallback_share = if total_own > 0 && total_market > 0 {
            (total_own as f64 / total_market as f64).clamp(0.0, MAX_CAPTURE_SHARE)
        } else {
            self.default_fallback
        };

        info!(
            pairs = share_by_pair.len(),
            fallback = fallback_share,
            window_days,
            "Capture calibration complete"
        );

        Ok(CaptureShares {
            share_by_pair,
            fallback_share,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_for_falls_back() {
        let mut share_by_pair = HashMap::new();
        share_by_pair.insert((10u64, 34u64), 0.12);
        let shares = CaptureShares {
            share_by_pair,
            fallback_share: 0.03,
        };

        assert!((shares.share_for(10, 34) - 0.12).abs() < f64::EPSILON);
        assert!((shares.share_for(10, 99) - 0.03).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_constant() {
        // Shares above the clamp would extrapolate from noise.
        assert!((5000.0f64 / 100.0).clamp(0.0, MAX_CAPTURE_SHARE) <= MAX_CAPTURE_SHARE);
    }
}
