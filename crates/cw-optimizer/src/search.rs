//! The search-strategy contract and strategy factory.

use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

use cw_types::{Aggregatable, ConfigSchema, Configuration, CwError, CwResult, EvaluationError};

use crate::bayesian::BayesianStrategy;
use crate::grid::GridStrategy;
use crate::random::RandomStrategy;
use crate::trial::{SearchState, StrategyOptions, StrategyPhase};

/// Scores one configuration. Strategies call this once per accepted candidate.
#[async_trait]
pub trait Objective<S>: Send {
    async fn evaluate(&mut self, config: &Configuration) -> Result<S, EvaluationError>;
}

/// Adapts a synchronous closure into an [`Objective`].
pub struct FnObjective<F>(pub F);

#[async_trait]
impl<S, F> Objective<S> for FnObjective<F>
where
    S: Send,
    F: FnMut(&Configuration) -> Result<S, EvaluationError> + Send,
{
    async fn evaluate(&mut self, config: &Configuration) -> Result<S, EvaluationError> {
        (self.0)(config)
    }
}

/// Common trait for all search strategies.
#[async_trait]
pub trait SearchStrategy<S: Aggregatable>: Send {
    /// Evaluate candidates through `objective`, recording every accepted
    /// (configuration, score) pair. Callable once per instance.
    async fn run_strategy(&mut self, objective: &mut dyn Objective<S>) -> CwResult<()>;

    /// Evaluation history accumulated so far.
    fn state(&self) -> &SearchState<S>;

    fn phase(&self) -> StrategyPhase;

    /// Human-readable strategy name.
    fn name(&self) -> &str;

    /// Highest-scoring configuration recorded, ties broken by first occurrence.
    fn choose_best_config(&self) -> Option<&Configuration> {
        self.state().best().map(|record| &record.config)
    }
}

/// Move a strategy from `Constructed` to `Running`, refusing any re-run.
pub(crate) fn begin_run(phase: &mut StrategyPhase, strategy: &str) -> CwResult<()> {
    match phase {
        StrategyPhase::Constructed => {
            *phase = StrategyPhase::Running;
            Ok(())
        }
        other => Err(CwError::StrategyState {
            strategy: strategy.to_string(),
            message: format!("strategy is {other:?}; a fresh instance is required"),
        }),
    }
}

/// The strategy variants the factory can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Grid,
    Random,
    Bayesian,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "GridStrategy",
            Self::Random => "RandomStrategy",
            Self::Bayesian => "BayesianStrategy",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = CwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GridStrategy" | "grid" => Ok(Self::Grid),
            "RandomStrategy" | "random" => Ok(Self::Random),
            "BayesianStrategy" | "bayesian" => Ok(Self::Bayesian),
            other => Err(CwError::UnknownStrategyKind(other.to_string())),
        }
    }
}

/// Instantiate a strategy. Grid and random strategies generate their
/// candidate lists here, before any evaluation.
pub fn build_strategy<S: Aggregatable>(
    kind: StrategyKind,
    schema: Arc<ConfigSchema>,
    max_runs: usize,
    options: &StrategyOptions,
) -> CwResult<Box<dyn SearchStrategy<S>>> {
    Ok(match kind {
        StrategyKind::Grid => Box::new(GridStrategy::new(schema, max_runs, options)?),
        StrategyKind::Random => Box::new(RandomStrategy::new(schema, max_runs, options)?),
        StrategyKind::Bayesian => Box::new(BayesianStrategy::new(schema, max_runs, options)?),
    })
}
