//! As-of price lookup over the market data provider.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use market_core::{DateRange, ItemId, LocationId, MarketDataProvider, PriceObservation};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// How far back an as-of lookup searches for the latest observation.
pub const AS_OF_LOOKBACK_DAYS: u64 = 30;

/// Resolves daily observations with as-of semantics: "latest observation
/// at or before the given date", tolerating gaps in the source data.
#[derive(Clone)]
pub struct PriceResolver {
    provider: Arc<dyn MarketDataProvider>,
}

impl PriceResolver {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Latest observation for the pair at or before `on_or_before`.
    ///
    /// `None` means no observation within the lookback window; callers
    /// treat that as "no trading signal", never as an error.
    pub async fn resolve(
        &self,
        location: LocationId,
        item: ItemId,
        on_or_before: NaiveDate,
    ) -> Result<Option<PriceObservation>> {
        let start = on_or_before
            .checked_sub_days(Days::new(AS_OF_LOOKBACK_DAYS))
            .unwrap_or(on_or_before);
        let range = match DateRange::new(start, on_or_before) {
            Ok(range) => range,
            Err(_) => return Ok(None),
        };

        let observations = self
            .provider
            .daily_observations(&[location], &[item], range)
            .await?;

        Ok(observations
            .into_iter()
            .filter(|o| o.location == location && o.item == item && o.date <= on_or_before)
            .max_by_key(|o| o.date))
    }

    /// Batch fetch for a set of pairs over a date range, returned as a
    /// grid the day loop can query without further provider calls.
    pub async fn resolve_many(
        &self,
        locations: &[LocationId],
        items: &[ItemId],
        range: DateRange,
    ) -> Result<ObservationGrid> {
        if locations.is_empty() || items.is_empty() {
            return Ok(ObservationGrid::default());
        }

        let observations = self
            .provider
            .daily_observations(locations, items, range)
            .await?;

        debug!(
            pairs = locations.len() * items.len(),
            observations = observations.len(),
            "Fetched observation grid"
        );
        Ok(ObservationGrid::from_observations(observations))
    }
}

/// Per-pair daily observation series with exact and as-of lookups.
#[derive(Debug, Clone, Default)]
pub struct ObservationGrid {
    series: HashMap<(LocationId, ItemId), BTreeMap<NaiveDate, PriceObservation>>,
}

impl ObservationGrid {
    pub fn from_observations(observations: Vec<PriceObservation>) -> Self {
        let mut series: HashMap<(LocationId, ItemId), BTreeMap<NaiveDate, PriceObservation>> =
            HashMap::new();
        for obs in observations {
            series
                .entry((obs.location, obs.item))
                .or_default()
                .insert(obs.date, obs);
        }
        Self { series }
    }

    /// Exact-date lookup, used by the simulator's day loop. A miss means
    /// the pair has no trading signal that day.
    pub fn on(
        &self,
        location: LocationId,
        item: ItemId,
        date: NaiveDate,
    ) -> Option<&PriceObservation> {
        self.series.get(&(location, item))?.get(&date)
    }

    /// Latest observation at or before `date`.
    pub fn as_of(
        &self,
        location: LocationId,
        item: ItemId,
        date: NaiveDate,
    ) -> Option<&PriceObservation> {
        self.series
            .get(&(location, item))?
            .range(..=date)
            .next_back()
            .map(|(_, obs)| obs)
    }

    /// Fold another grid into this one. Overlapping (pair, day) entries
    /// are replaced by the incoming observation.
    pub fn merge(&mut self, other: ObservationGrid) {
        for (pair, days) in other.series {
            self.series.entry(pair).or_default().extend(days);
        }
    }

    /// Total traded units for a pair across the range.
    pub fn pair_volume(&self, location: LocationId, item: ItemId, range: DateRange) -> u64 {
        self.series
            .get(&(location, item))
            .map(|days| {
                days.range(range.start..=range.end)
                    .map(|(_, obs)| obs.volume)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
