//! Search orchestration: wires a strategy to the evaluation runner.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use cw_optimizer::{
    build_strategy, EvaluationRecord, Objective, SearchId, SearchStatus, StrategyOptions,
};
use cw_types::{Aggregatable, ConfigSchema, Configuration, CwError, CwResult, EvaluationError};

use crate::config::SearchConfig;
use crate::program::{Dataset, Program};
use crate::runner::EvaluationRunner;
use crate::scoring::ScoringFunction;
use crate::telemetry::{Telemetry, TelemetrySink, TracingSink};

/// Outcome of a completed search run.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport<S> {
    pub run_id: SearchId,
    /// Every accepted candidate with its aggregate score, in evaluation order.
    pub records: Vec<EvaluationRecord<S>>,
    pub best: Option<EvaluationRecord<S>>,
    pub status: SearchStatus,
}

impl<S> SearchReport<S> {
    pub fn best_config(&self) -> Option<&Configuration> {
        self.best.as_ref().map(|record| &record.config)
    }
}

/// Finds the configuration of a program that scores best on a dataset.
pub struct SearchEngine<I, O> {
    schema: Arc<ConfigSchema>,
    program: Arc<dyn Program<I, O>>,
    sink: Arc<dyn TelemetrySink>,
}

impl<I, O> SearchEngine<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Validates `schema` once; an ill-formed schema is fatal here, before any
    /// search.
    pub fn new<P>(schema: ConfigSchema, program: P) -> CwResult<Self>
    where
        P: Program<I, O> + 'static,
    {
        schema.validate()?;
        Ok(Self {
            schema: Arc::new(schema),
            program: Arc::new(program),
            sink: Arc::new(TracingSink),
        })
    }

    pub fn with_telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    /// Search with the named runner and strategy and return the best
    /// configuration found.
    pub async fn find_best_configuration<S, F>(
        &self,
        dataset: impl Into<Dataset<I, O>>,
        scoring: F,
        runner_kind: &str,
        strategy_kind: &str,
        max_runs: usize,
        strategy_options: StrategyOptions,
    ) -> CwResult<Configuration>
    where
        S: Aggregatable,
        F: ScoringFunction<O, S> + 'static,
    {
        let config = SearchConfig::default()
            .with_runner(runner_kind)
            .with_strategy(strategy_kind)
            .with_max_runs(max_runs)
            .with_strategy_options(strategy_options);
        let report = self.search(dataset, scoring, &config).await?;
        report.best.map(|record| record.config).ok_or(CwError::NoCandidates)
    }

    /// Run one search described by `config` and report every evaluation.
    pub async fn search<S, F>(
        &self,
        dataset: impl Into<Dataset<I, O>>,
        scoring: F,
        config: &SearchConfig,
    ) -> CwResult<SearchReport<S>>
    where
        S: Aggregatable,
        F: ScoringFunction<O, S> + 'static,
    {
        let runner_kind = config.runner_kind()?;
        let strategy_kind = config.strategy_kind()?;

        let runner =
            EvaluationRunner::from_kind(runner_kind).with_options(config.runner_options.clone());
        let mut strategy = build_strategy::<S>(
            strategy_kind,
            Arc::clone(&self.schema),
            config.max_runs,
            &config.strategy_options,
        )?;

        let mut status = SearchStatus::new(
            config.id,
            strategy_kind.as_str(),
            runner_kind.as_str(),
            config.max_runs,
        );
        let telemetry = Telemetry::open(config.id, Arc::clone(&self.sink));
        status.mark_running();
        telemetry.search_started(&status);
        info!(
            "Starting search {} ({}) with {} / {}",
            config.id,
            config.name,
            strategy.name(),
            runner_kind.as_str()
        );

        let outcome = {
            let mut objective = RunnerObjective {
                runner: &runner,
                program: Arc::clone(&self.program),
                dataset: dataset.into(),
                scoring: Arc::new(scoring),
                telemetry: &telemetry,
                status: &mut status,
            };
            strategy.run_strategy(&mut objective).await
        };

        if let Err(e) = outcome {
            warn!("Search {} failed: {}", config.id, e);
            status.mark_failed(e.to_string());
            telemetry.search_finished(&status);
            telemetry.close();
            return Err(e);
        }

        status.mark_completed();
        telemetry.search_finished(&status);
        telemetry.close();

        let state = strategy.state();
        let report = SearchReport {
            run_id: config.id,
            records: state.records().to_vec(),
            best: state.best().cloned(),
            status,
        };
        info!(
            "Search {} finished: {} records, best objective {:?}",
            report.run_id,
            report.records.len(),
            report.best.as_ref().map(|r| r.score.objective())
        );
        Ok(report)
    }
}

/// Objective that scores a configuration with the runner and reports each
/// evaluation to telemetry.
struct RunnerObjective<'a, I, O, S> {
    runner: &'a EvaluationRunner,
    program: Arc<dyn Program<I, O>>,
    dataset: Dataset<I, O>,
    scoring: Arc<dyn ScoringFunction<O, S>>,
    telemetry: &'a Telemetry,
    status: &'a mut SearchStatus,
}

#[async_trait]
impl<'a, I, O, S> Objective<S> for RunnerObjective<'a, I, O, S>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
    S: Aggregatable,
{
    async fn evaluate(&mut self, config: &Configuration) -> Result<S, EvaluationError> {
        let started = Instant::now();
        let score = self
            .runner
            .run(
                config,
                Arc::clone(&self.program),
                &self.dataset,
                Arc::clone(&self.scoring),
            )
            .await?;
        let trial_number = self.status.candidates_evaluated;
        self.status.record_candidate(score.objective());
        self.telemetry
            .candidate_evaluated(trial_number, config, score.objective(), started.elapsed());
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunnerOptions;
    use crate::scoring::PairScorer;
    use crate::telemetry::{MemorySink, SearchEvent};
    use cw_optimizer::SearchRunState;
    use cw_types::MetricScore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn factor_engine() -> SearchEngine<f64, f64> {
        let schema = ConfigSchema::new().add_float_range("factor", 0.0, 10.0);
        SearchEngine::new(schema, |config: &Configuration, input: &f64| -> anyhow::Result<f64> {
            Ok(config.get_float("factor").unwrap_or(0.0) * input)
        })
        .unwrap()
    }

    fn doubling() -> Vec<(f64, f64)> {
        vec![(1.0, 2.0), (2.0, 4.0)]
    }

    fn closeness() -> PairScorer<fn(&f64, &f64) -> f64> {
        let f: fn(&f64, &f64) -> f64 = |p, t| 1.0 / (1.0 + (p - t).abs());
        PairScorer::new(f)
    }

    #[tokio::test]
    async fn random_search_reports_the_best_of_its_records() {
        let engine = factor_engine();
        let config = SearchConfig::new("random")
            .with_strategy("RandomStrategy")
            .with_max_runs(20);
        let report = engine.search(doubling(), closeness(), &config).await.unwrap();

        // Twenty evenly spaced factors over [0, 10] all get drawn.
        assert_eq!(report.records.len(), 20);
        let best = report.best.as_ref().unwrap();
        for record in &report.records {
            assert!(best.score >= record.score);
            let factor = record.config.get_float("factor").unwrap();
            assert!((0.0..=10.0).contains(&factor));
        }
        let factor = best.config.get_float("factor").unwrap();
        assert!((factor - 40.0 / 19.0).abs() < 1e-9, "factor = {factor}");
    }

    #[tokio::test]
    async fn repeated_searches_agree() {
        let engine = factor_engine();
        let first = engine
            .find_best_configuration(
                doubling(),
                closeness(),
                "AllMean",
                "random",
                12,
                StrategyOptions::default(),
            )
            .await
            .unwrap();
        let second = engine
            .find_best_configuration(
                doubling(),
                closeness(),
                "AllMean",
                "random",
                12,
                StrategyOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn grid_search_respects_cross_field_rule() {
        let schema = ConfigSchema::new()
            .add_categorical("mode", vec![json!("a"), json!("b")])
            .add_float_range("factor_a", 0.0, 10.0)
            .with_validator(|config| {
                if config.get_str("mode") == Some("b") && config.get_float("factor_a") != Some(0.0) {
                    return Err("factor_a must be 0 in mode b".into());
                }
                Ok(())
            });
        let program = |config: &Configuration, input: &f64| -> anyhow::Result<f64> {
            let bonus = if config.get_str("mode") == Some("b") { 5.0 } else { 0.0 };
            Ok(config.get_float("factor_a").unwrap_or(0.0) * input + bonus)
        };
        let engine = SearchEngine::<f64, f64>::new(schema, program).unwrap();

        let config = SearchConfig::new("modes")
            .with_strategy("GridStrategy")
            .with_max_runs(15)
            .with_seed(9);
        let report = engine.search(doubling(), closeness(), &config).await.unwrap();
        assert!(!report.records.is_empty());
        assert!(report.records.len() <= 15);
        for record in &report.records {
            if record.config.get_str("mode") == Some("b") {
                assert_eq!(record.config.get_float("factor_a"), Some(0.0));
            }
        }
        let best = report.best_config().unwrap();
        assert!(report.records.iter().all(|r| r.score <= report.best.as_ref().unwrap().score));
        assert!(engine.schema().build(best.iter().map(|(k, v)| (k.to_string(), v.clone()))).is_ok());
    }

    #[tokio::test]
    async fn bayesian_search_reports_valid_records() {
        let engine = factor_engine();
        let config = SearchConfig::new("bo").with_max_runs(12).with_runner("Median");
        let report = engine.search(doubling(), closeness(), &config).await.unwrap();
        assert_eq!(report.records.len(), 12);
        assert_eq!(report.status.state, SearchRunState::Completed);
        assert_eq!(report.status.candidates_evaluated, 12);
        assert_eq!(report.status.runner, "Median");
        assert!(report.status.elapsed_ms().is_some());
        for (i, record) in report.records.iter().enumerate() {
            assert_eq!(record.trial_number, i);
            let factor = record.config.get_float("factor").unwrap();
            assert!((0.0..=10.0).contains(&factor));
        }
    }

    #[tokio::test]
    async fn unknown_kinds_fail_before_any_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let engine = SearchEngine::<f64, f64>::new(
            ConfigSchema::new().add_int_range("n", 0, 3),
            move |_: &Configuration, input: &f64| -> anyhow::Result<f64> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(*input)
            },
        )
        .unwrap();

        let err = engine
            .find_best_configuration(
                doubling(),
                closeness(),
                "AllMean",
                "Annealing",
                5,
                StrategyOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CwError::UnknownStrategyKind(_)));

        let err = engine
            .find_best_configuration(
                doubling(),
                closeness(),
                "BestCase",
                "grid",
                5,
                StrategyOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CwError::UnknownRunnerKind(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ill_formed_schema_is_rejected_at_construction() {
        let schema = ConfigSchema::new().add_float_range("factor", 5.0, 1.0);
        let result =
            SearchEngine::<f64, f64>::new(schema, |_: &Configuration, x: &f64| -> anyhow::Result<f64> {
                Ok(*x)
            });
        assert!(matches!(result, Err(CwError::InvalidFieldType { .. })));
    }

    #[tokio::test]
    async fn empty_budget_has_no_candidates() {
        let engine = factor_engine();
        let err = engine
            .find_best_configuration(
                doubling(),
                closeness(),
                "AllMean",
                "grid",
                0,
                StrategyOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CwError::NoCandidates));
    }

    #[tokio::test]
    async fn program_failure_aborts_search_and_is_reported() {
        let sink = Arc::new(MemorySink::new());
        let engine = SearchEngine::<f64, f64>::new(
            ConfigSchema::new().add_bool("flag"),
            |_: &Configuration, _: &f64| -> anyhow::Result<f64> { anyhow::bail!("model unavailable") },
        )
        .unwrap()
        .with_telemetry(sink.clone());

        let err = engine
            .search(
                doubling(),
                closeness(),
                &SearchConfig::new("fails").with_strategy("grid"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CwError::Evaluation(EvaluationError::Program { .. })));

        let events = sink.events();
        assert!(matches!(events.first(), Some(SearchEvent::SearchStarted { .. })));
        match events.last() {
            Some(SearchEvent::SearchFinished { state, error, .. }) => {
                assert_eq!(*state, SearchRunState::Failed);
                assert!(error.as_deref().unwrap_or_default().contains("model unavailable"));
            }
            other => panic!("unexpected final event {other:?}"),
        }
    }

    #[tokio::test]
    async fn telemetry_sees_every_candidate() {
        let sink = Arc::new(MemorySink::new());
        let engine = factor_engine().with_telemetry(sink.clone());
        let config = SearchConfig::new("observed")
            .with_strategy("random")
            .with_max_runs(6)
            .with_runner_options(RunnerOptions::default().with_max_concurrency(1));
        let report = engine.search(doubling(), closeness(), &config).await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), report.records.len() + 2);
        let evaluated: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::CandidateEvaluated { run_id, objective, .. } => {
                    assert_eq!(*run_id, config.id);
                    Some(*objective)
                }
                _ => None,
            })
            .collect();
        let recorded: Vec<f64> = report.records.iter().map(|r| r.score).collect();
        assert_eq!(evaluated, recorded);
    }

    #[tokio::test]
    async fn structured_scores_flow_through_search() {
        let engine = factor_engine();
        let scoring = PairScorer::new(|p: &f64, t: &f64| {
            MetricScore::new(-(p - t).abs()).with_metric("prediction", *p)
        });
        let config = SearchConfig::new("metrics").with_strategy("random").with_max_runs(5);
        let report = engine.search(doubling(), scoring, &config).await.unwrap();
        let best = report.best.unwrap();
        assert!(best.score.metric("prediction").is_some());
        assert!(report
            .records
            .iter()
            .all(|r| r.score.objective <= best.score.objective));
    }
}
