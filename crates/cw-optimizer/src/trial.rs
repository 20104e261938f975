//! Evaluation records, per-strategy search state and run lifecycle tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cw_types::{Aggregatable, Configuration};

/// Unique search run identifier.
pub type SearchId = Uuid;

/// Default sentinel score returned for invalid Bayesian probes.
pub const DEFAULT_MIN_SCORE: f64 = -1.0;

/// Strategy-specific options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOptions {
    /// Score reported to the Bayesian optimizer for probes that decode to an
    /// invalid configuration (ignored by grid/random).
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// RNG seed. `None` uses the strategy's default (random: 42, Bayesian: 1,
    /// grid: OS entropy).
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            seed: None,
        }
    }
}

impl StrategyOptions {
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One accepted candidate and its aggregate score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord<S> {
    pub trial_number: usize,
    pub config: Configuration,
    pub score: S,
}

/// Ordered evaluation history owned by one strategy instance.
///
/// Configurations and scores live in the same record, so the two views are
/// always the same length and index-aligned.
#[derive(Debug, Clone, Serialize)]
pub struct SearchState<S> {
    records: Vec<EvaluationRecord<S>>,
}

impl<S> Default for SearchState<S> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<S: Aggregatable> SearchState<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, config: Configuration, score: S) {
        let trial_number = self.records.len();
        self.records.push(EvaluationRecord {
            trial_number,
            config,
            score,
        });
    }

    pub fn records(&self) -> &[EvaluationRecord<S>] {
        &self.records
    }

    pub fn configs(&self) -> impl Iterator<Item = &Configuration> {
        self.records.iter().map(|r| &r.config)
    }

    pub fn scores(&self) -> impl Iterator<Item = &S> {
        self.records.iter().map(|r| &r.score)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest-scoring record; ties go to the earliest one.
    pub fn best(&self) -> Option<&EvaluationRecord<S>> {
        self.records.iter().fold(None, |best, record| match best {
            Some(current) if record.score.compare(&current.score).is_le() => Some(current),
            _ => Some(record),
        })
    }

    pub fn into_records(self) -> Vec<EvaluationRecord<S>> {
        self.records
    }
}

/// Lifecycle of a strategy instance. A finished strategy cannot run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyPhase {
    Constructed,
    Running,
    Done,
}

/// Lifecycle state for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchRunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub id: SearchId,
    pub strategy: String,
    pub runner: String,
    pub max_runs: usize,
    pub state: SearchRunState,
    pub candidates_evaluated: usize,
    pub best_objective: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SearchStatus {
    pub fn new(id: SearchId, strategy: &str, runner: &str, max_runs: usize) -> Self {
        Self {
            id,
            strategy: strategy.to_string(),
            runner: runner.to_string(),
            max_runs,
            state: SearchRunState::Pending,
            candidates_evaluated: 0,
            best_objective: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SearchRunState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SearchRunState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = SearchRunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Count one evaluated candidate and keep the best objective seen.
    pub fn record_candidate(&mut self, objective: f64) {
        self.candidates_evaluated += 1;
        let improves = match self.best_objective {
            None => true,
            Some(best) => objective > best,
        };
        if improves {
            self.best_objective = Some(objective);
        }
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}
