//! Search run configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cw_optimizer::{SearchId, StrategyKind, StrategyOptions};
use cw_types::{config_error, CwResult};

use crate::runner::{RunnerKind, RunnerOptions};

pub const DEFAULT_MAX_RUNS: usize = 10;

/// Everything needed to run one search besides the schema, program, dataset
/// and scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub id: SearchId,
    pub name: String,

    /// Strategy name: "GridStrategy", "RandomStrategy" or "BayesianStrategy"
    /// (lower-case short forms accepted).
    pub strategy: String,

    /// Runner name: "AllMean", "WorstCase" or "Median".
    pub runner: String,

    /// Trial budget.
    pub max_runs: usize,

    pub strategy_options: StrategyOptions,
    pub runner_options: RunnerOptions,
    pub created_at: DateTime<Utc>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            strategy: StrategyKind::Bayesian.as_str().to_string(),
            runner: RunnerKind::AllMean.as_str().to_string(),
            max_runs: DEFAULT_MAX_RUNS,
            strategy_options: StrategyOptions::default(),
            runner_options: RunnerOptions::default(),
            created_at: Utc::now(),
        }
    }
}

impl SearchConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> CwResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.strategy_kind()?;
        config.runner_kind()?;
        if config.runner_options.max_concurrency == Some(0) {
            return Err(config_error!("max_concurrency must be at least 1"));
        }
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = strategy.to_string();
        self
    }

    pub fn with_runner(mut self, runner: &str) -> Self {
        self.runner = runner.to_string();
        self
    }

    pub fn with_max_runs(mut self, n: usize) -> Self {
        self.max_runs = n;
        self
    }

    pub fn with_strategy_options(mut self, options: StrategyOptions) -> Self {
        self.strategy_options = options;
        self
    }

    pub fn with_runner_options(mut self, options: RunnerOptions) -> Self {
        self.runner_options = options;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.strategy_options.seed = Some(seed);
        self
    }

    pub fn strategy_kind(&self) -> CwResult<StrategyKind> {
        self.strategy.parse()
    }

    pub fn runner_kind(&self) -> CwResult<RunnerKind> {
        self.runner.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_types::CwError;

    #[test]
    fn defaults_match_documented_values() {
        let config = SearchConfig::new("tune");
        assert_eq!(config.name, "tune");
        assert_eq!(config.strategy_kind().unwrap(), StrategyKind::Bayesian);
        assert_eq!(config.runner_kind().unwrap(), RunnerKind::AllMean);
        assert_eq!(config.max_runs, 10);
        assert_eq!(config.strategy_options.min_score, -1.0);
    }

    #[test]
    fn builders_override_fields() {
        let config = SearchConfig::new("tune")
            .with_strategy("grid")
            .with_runner("Median")
            .with_max_runs(25)
            .with_seed(7)
            .with_runner_options(RunnerOptions::default().with_max_concurrency(4));
        assert_eq!(config.strategy_kind().unwrap(), StrategyKind::Grid);
        assert_eq!(config.runner_kind().unwrap(), RunnerKind::Median);
        assert_eq!(config.max_runs, 25);
        assert_eq!(config.strategy_options.seed, Some(7));
        assert_eq!(config.runner_options.max_concurrency, Some(4));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = SearchConfig::from_json_str(
            r#"{"name": "sql", "strategy": "RandomStrategy", "max_runs": 20,
                "strategy_options": {"seed": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.strategy_kind().unwrap(), StrategyKind::Random);
        assert_eq!(config.runner, "AllMean");
        assert_eq!(config.max_runs, 20);
        assert_eq!(config.strategy_options.seed, Some(3));
        assert_eq!(config.strategy_options.min_score, -1.0);
    }

    #[test]
    fn json_rejects_unknown_kinds_and_bad_options() {
        assert!(matches!(
            SearchConfig::from_json_str(r#"{"strategy": "Annealing"}"#),
            Err(CwError::UnknownStrategyKind(_))
        ));
        assert!(matches!(
            SearchConfig::from_json_str(r#"{"runner": "BestCase"}"#),
            Err(CwError::UnknownRunnerKind(_))
        ));
        assert!(matches!(
            SearchConfig::from_json_str(r#"{"runner_options": {"max_concurrency": 0}}"#),
            Err(CwError::Config(_))
        ));
        assert!(matches!(
            SearchConfig::from_json_str("not json"),
            Err(CwError::Serialization(_))
        ));
    }
}
