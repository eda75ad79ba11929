//! Read-through cache of raw liquidity snapshots.
//!
//! Keyed by `(anchor_date, window_days)`. The first requester of a key
//! computes and stores the snapshot; concurrent and later requesters
//! reuse it. Distinct keys proceed independently.

use anyhow::Result;
use backtester::SnapshotFetcher;
use chrono::NaiveDate;
use dashmap::DashMap;
use market_core::{LiquiditySnapshot, MarketDataProvider};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct SnapshotCache {
    market: Arc<dyn MarketDataProvider>,
    entries: DashMap<(NaiveDate, u32), Arc<OnceCell<Arc<LiquiditySnapshot>>>>,
}

impl SnapshotCache {
    pub fn new(market: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            market,
            entries: DashMap::new(),
        }
    }

    /// Fetch-or-compute-once: exactly one provider call happens per key,
    /// no matter how many workers ask concurrently.
    pub async fn get(
        &self,
        anchor_date: NaiveDate,
        window_days: u32,
    ) -> Result<Arc<LiquiditySnapshot>> {
        let cell = self
            .entries
            .entry((anchor_date, window_days))
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let snapshot = cell
            .get_or_try_init(|| async {
                debug!(anchor = %anchor_date, window_days, "Fetching liquidity snapshot");
                self.market
                    .liquidity_candidates(anchor_date, window_days)
                    .await
                    .map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(snapshot))
    }

    /// Number of keys currently cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A [`SnapshotFetcher`] the plan builder can use, routing every
    /// snapshot request through this cache.
    pub fn fetcher(self: &Arc<Self>) -> SnapshotFetcher {
        let cache = Arc::clone(self);
        Arc::new(move |anchor_date, window_days| {
            let cache = Arc::clone(&cache);
            Box::pin(async move { cache.get(anchor_date, window_days).await })
        })
    }
}
