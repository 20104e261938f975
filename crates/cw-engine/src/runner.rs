//! Evaluation runner: one configuration against the whole dataset.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use cw_types::{Aggregatable, Configuration, CwError, EvaluationError};

use crate::aggregation::Aggregation;
use crate::program::{Dataset, Program};
use crate::scoring::{score_sample, ScoringFunction};

/// Concurrency controls for the per-sample fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerOptions {
    /// Samples evaluated at once. `None` runs the whole dataset at once.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Per-sample deadline. A sample that misses it fails the batch; its
    /// blocking thread is left to finish on its own.
    #[serde(default)]
    pub sample_timeout_ms: Option<u64>,
}

impl RunnerOptions {
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    pub fn with_sample_timeout_ms(mut self, ms: u64) -> Self {
        self.sample_timeout_ms = Some(ms);
        self
    }
}

/// Runner variants selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerKind {
    AllMean,
    WorstCase,
    Median,
}

impl RunnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllMean => "AllMean",
            Self::WorstCase => "WorstCase",
            Self::Median => "Median",
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Self::AllMean => Aggregation::AllMean,
            Self::WorstCase => Aggregation::WorstCase,
            Self::Median => Aggregation::median(),
        }
    }
}

impl FromStr for RunnerKind {
    type Err = CwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AllMean" => Ok(Self::AllMean),
            "WorstCase" => Ok(Self::WorstCase),
            "Median" => Ok(Self::Median),
            other => Err(CwError::UnknownRunnerKind(other.to_string())),
        }
    }
}

/// Runs a program over every dataset sample and aggregates the scores.
///
/// Each sample gets its own task; the program and the scoring function run on
/// the blocking pool. The first failing sample aborts the rest of the batch.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRunner {
    aggregation: Aggregation,
    options: RunnerOptions,
}

impl EvaluationRunner {
    pub fn new(aggregation: Aggregation) -> Self {
        Self {
            aggregation,
            options: RunnerOptions::default(),
        }
    }

    pub fn from_kind(kind: RunnerKind) -> Self {
        Self::new(kind.aggregation())
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Score `config` on `dataset`.
    pub async fn run<I, O, S>(
        &self,
        config: &Configuration,
        program: Arc<dyn Program<I, O>>,
        dataset: &Dataset<I, O>,
        scoring: Arc<dyn ScoringFunction<O, S>>,
    ) -> Result<S, EvaluationError>
    where
        I: Send + Sync + 'static,
        O: Send + Sync + 'static,
        S: Aggregatable,
    {
        if dataset.is_empty() {
            return Err(EvaluationError::EmptyDataset);
        }

        let concurrency = self.options.max_concurrency.unwrap_or(dataset.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let config = Arc::new(config.clone());
        let timeout_ms = self.options.sample_timeout_ms;

        let mut tasks: JoinSet<(usize, Result<S, EvaluationError>)> = JoinSet::new();
        for sample in 0..dataset.len() {
            let semaphore = Arc::clone(&semaphore);
            let program = Arc::clone(&program);
            let scoring = Arc::clone(&scoring);
            let dataset = Arc::clone(dataset);
            let config = Arc::clone(&config);
            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        let work = tokio::task::spawn_blocking(move || {
                            let (input, expected) = &dataset[sample];
                            evaluate_sample(sample, &*program, &*scoring, &config, input, expected)
                        });
                        await_sample(sample, work, timeout_ms).await
                    }
                    Err(e) => Err(EvaluationError::TaskFailed {
                        sample,
                        message: e.to_string(),
                    }),
                };
                (sample, result)
            });
        }

        let mut scores: Vec<Option<S>> = vec![None; dataset.len()];
        while let Some(joined) = tasks.join_next().await {
            let (sample, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    let sample = scores.iter().position(Option::is_none).unwrap_or(0);
                    return Err(EvaluationError::TaskFailed {
                        sample,
                        message: e.to_string(),
                    });
                }
            };
            match result {
                Ok(score) => scores[sample] = Some(score),
                Err(e) => {
                    debug!("Sample {} failed, aborting {} pending tasks", sample, tasks.len());
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let scores: Vec<S> = scores.into_iter().flatten().collect();
        if scores.len() != dataset.len() {
            return Err(EvaluationError::Aggregation {
                message: format!("{} of {} samples produced a score", scores.len(), dataset.len()),
            });
        }
        self.aggregation.aggregate(&scores)
    }
}

async fn await_sample<S>(
    sample: usize,
    work: tokio::task::JoinHandle<Result<S, EvaluationError>>,
    timeout_ms: Option<u64>,
) -> Result<S, EvaluationError> {
    let joined = match timeout_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), work).await {
            Ok(joined) => joined,
            Err(_) => {
                return Err(EvaluationError::Timeout {
                    sample,
                    timeout_ms: ms,
                })
            }
        },
        None => work.await,
    };
    joined.map_err(|e| EvaluationError::TaskFailed {
        sample,
        message: e.to_string(),
    })?
}

fn evaluate_sample<I, O, S>(
    sample: usize,
    program: &dyn Program<I, O>,
    scoring: &dyn ScoringFunction<O, S>,
    config: &Configuration,
    input: &I,
    expected: &O,
) -> Result<S, EvaluationError> {
    let predicted = program
        .run(config, input)
        .map_err(|source| EvaluationError::Program { sample, source })?;
    score_sample(scoring, &predicted, expected)
        .map_err(|source| EvaluationError::Scoring { sample, source })
}
