//! Random sampling over representative pools.

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info};

use cw_types::{Aggregatable, ConfigSchema, Configuration, CwResult};

use crate::cartesian::CartesianPools;
use crate::search::{begin_run, Objective, SearchStrategy};
use crate::trial::{SearchState, StrategyOptions, StrategyPhase};

const DEFAULT_SEED: u64 = 42;

/// Independent random sampling across the search space.
///
/// Each field contributes `max_runs` representative values; `max_runs`
/// distinct joint points are drawn from their product (all of them, in random
/// order, when the product is smaller). Draws that fail validation are dropped
/// and not replaced, so fewer than `max_runs` candidates may remain.
#[derive(Debug)]
pub struct RandomStrategy<S> {
    candidates: Vec<Configuration>,
    state: SearchState<S>,
    phase: StrategyPhase,
}

impl<S: Aggregatable> RandomStrategy<S> {
    pub fn new(
        schema: Arc<ConfigSchema>,
        max_runs: usize,
        options: &StrategyOptions,
    ) -> CwResult<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(options.seed.unwrap_or(DEFAULT_SEED));
        let pools = CartesianPools::from_schema(&schema, max_runs, &mut rng)?;

        let mut points = pools.shuffled(&mut rng);
        let mut candidates = Vec::with_capacity(max_runs);
        let mut drawn = 0usize;
        while drawn < max_runs {
            let Some(coords) = points.next_coords(&mut rng) else {
                break;
            };
            drawn += 1;
            if let Ok(config) = schema.build(pools.point(&coords)) {
                candidates.push(config);
            }
        }

        info!(
            "Random strategy kept {} of {} sampled candidates",
            candidates.len(),
            drawn
        );
        Ok(Self {
            candidates,
            state: SearchState::new(),
            phase: StrategyPhase::Constructed,
        })
    }

    pub fn candidates(&self) -> &[Configuration] {
        &self.candidates
    }
}

#[async_trait]
impl<S: Aggregatable> SearchStrategy<S> for RandomStrategy<S> {
    async fn run_strategy(&mut self, objective: &mut dyn Objective<S>) -> CwResult<()> {
        begin_run(&mut self.phase, "random")?;
        for config in &self.candidates {
            let score = objective.evaluate(config).await?;
            debug!("Random candidate {} scored {:.6}", config, score.objective());
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
        "random"
    }
}
