//! Batch executor wiring: simulator, snapshot cache, and worker pool.

use crate::cache::SnapshotCache;
use crate::pool::run_bounded;
use backtester::{CycleSimulator, HistoricalPlanBuilder, PriceResolver, RunReport, SimulationRequest};
use market_core::{LabConfig, MarketDataProvider, PackagePlanner, PackingConstraints, SimulationRun};
use std::sync::Arc;
use tracing::warn;

/// Runs batches of simulations with bounded concurrency. Workers share
/// only the read-through snapshot cache.
pub struct ScenarioOrchestrator {
    simulator: Arc<CycleSimulator>,
    cache: Arc<SnapshotCache>,
    concurrency: usize,
}

impl ScenarioOrchestrator {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        packer: Arc<dyn PackagePlanner>,
        config: &LabConfig,
    ) -> Self {
        let cache = Arc::new(SnapshotCache::new(Arc::clone(&market)));
        let plan_builder = HistoricalPlanBuilder::new(
            PriceResolver::new(Arc::clone(&market)),
            cache.fetcher(),
            packer,
            PackingConstraints::default(),
        );
        let simulator = Arc::new(CycleSimulator::new(market, Arc::new(plan_builder)));

        Self {
            simulator,
            cache,
            concurrency: config.concurrency,
        }
    }

    /// The shared snapshot cache (exposed for inspection in tests and
    /// for reuse across batches of the same lab session).
    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Execute a batch of runs through the worker pool. One run's
    /// failure never aborts the batch; it comes back as a FAILED run.
    pub(crate) async fn run_many(&self, requests: Vec<SimulationRequest>) -> Vec<RunReport> {
        let simulator = Arc::clone(&self.simulator);
        run_bounded(requests, self.concurrency, move |request| {
            let simulator = Arc::clone(&simulator);
            async move {
                let strategy_id = request.strategy.id;
                let label = request.label.clone();
                let range = request.range;
                let capital = request.initial_capital;

                match simulator.run(request).await {
                    Ok(report) => report,
                    Err(err) => {
                        // Engine-internal invariant breakage; isolate it
                        // like any other failed run.
                        warn!(error = %err, label = %label, "Run aborted outside the simulator");
                        let mut run = SimulationRun::new(strategy_id, label, range, capital);
                        let _ = run.fail(err.to_string());
                        RunReport {
                            run,
                            positions: Vec::new(),
                            days: Vec::new(),
                            cycles: Vec::new(),
                        }
                    }
                }
            }
        })
        .await
    }
}
