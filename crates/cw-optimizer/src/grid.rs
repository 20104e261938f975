//! Grid search with resolution escalation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info};

use cw_types::{Aggregatable, ConfigSchema, Configuration, CwResult};

use crate::cartesian::CartesianPools;
use crate::search::{begin_run, Objective, SearchStrategy};
use crate::trial::{SearchState, StrategyOptions, StrategyPhase};

/// Approximate exhaustive search under a fixed trial budget.
///
/// Candidates are generated at construction. Starting at resolution `k = 1`,
/// every field contributes up to `k` representative values; the Cartesian
/// product is shuffled and validated entry by entry until `max_runs`
/// candidates are accepted. A level that runs out of points before filling
/// the budget is discarded and the next level starts from scratch, so the
/// grid never mixes resolutions. The last level attempted keeps whatever it
/// accepted, and escalation stops as soon as a higher `k` cannot produce any
/// new point.
#[derive(Debug)]
pub struct GridStrategy<S> {
    max_runs: usize,
    candidates: Vec<Configuration>,
    resolution: usize,
    state: SearchState<S>,
    phase: StrategyPhase,
}

impl<S: Aggregatable> GridStrategy<S> {
    pub fn new(
        schema: Arc<ConfigSchema>,
        max_runs: usize,
        options: &StrategyOptions,
    ) -> CwResult<Self> {
        let mut rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (candidates, resolution) = Self::build_candidates(&schema, max_runs, &mut rng)?;
        info!(
            "Grid strategy prepared {} candidates at resolution {} (budget {})",
            candidates.len(),
            resolution,
            max_runs
        );
        Ok(Self {
            max_runs,
            candidates,
            resolution,
            state: SearchState::new(),
            phase: StrategyPhase::Constructed,
        })
    }

    fn build_candidates(
        schema: &ConfigSchema,
        max_runs: usize,
        rng: &mut ChaCha8Rng,
    ) -> CwResult<(Vec<Configuration>, usize)> {
        let mut candidates = Vec::new();
        let mut resolution = 0;

        for k in 1..=max_runs {
            resolution = k;
            candidates.clear();

            let pools = CartesianPools::from_schema(schema, k, rng)?;
            let mut points = pools.shuffled(rng);
            let mut rejected = 0usize;
            while candidates.len() < max_runs {
                let Some(coords) = points.next_coords(rng) else {
                    break;
                };
                match schema.build(pools.point(&coords)) {
                    Ok(config) => candidates.push(config),
                    Err(_) => rejected += 1,
                }
            }

            if candidates.len() >= max_runs {
                break;
            }

            // Every pool came back smaller than requested: a larger k yields
            // the same product.
            let saturated = pools.pool_sizes().iter().all(|&size| size < k);
            debug!(
                "Grid level {} exhausted: {} accepted, {} rejected{}",
                k,
                candidates.len(),
                rejected,
                if saturated { ", pools saturated" } else { "" }
            );
            if saturated {
                break;
            }
        }

        Ok((candidates, resolution))
    }

    /// Candidates prepared at construction, in evaluation order.
    pub fn candidates(&self) -> &[Configuration] {
        &self.candidates
    }

    /// Resolution `k` the candidate list was built at.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn max_runs(&self) -> usize {
        self.max_runs
    }
}

#[async_trait]
impl<S: Aggregatable> SearchStrategy<S> for GridStrategy<S> {
    async fn run_strategy(&mut self, objective: &mut dyn Objective<S>) -> CwResult<()> {
        begin_run(&mut self.phase, "grid")?;
        for config in &self.candidates {
            let score = objective.evaluate(config).await?;
            debug!("Grid candidate {} scored {:.6}", config, score.objective());
            self.state.push(config.clone(), score);
        }
        self.phase = StrategyPhase::Done;
        Ok(())
    }

    fn state(&self) -> &SearchState<S> {
        &self.state
    }

    fn phase(&self) -> StrategyPhase {
        self.phase
    }

    fn name(&self) -> &str {
        "grid"
    }
}
