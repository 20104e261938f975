//! Sequential model-based (Bayesian) search.
//!
//! The optimizer works on a continuous box built from each field's numeric
//! domain. Every probe is decoded back into typed values and validated; a
//! probe that does not form a valid configuration reports the `min_score`
//! sentinel to the surrogate instead of being evaluated. After the run, the
//! probe history is re-decoded and only probes that validate are kept as
//! evaluation records.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

use cw_types::{Aggregatable, ConfigSchema, Configuration, CwResult, FieldValue, ValidationError};

use crate::encoding::NumericEncoder;
use crate::gp::{GaussianProcess, DEFAULT_NOISE_VARIANCE};
use crate::search::{begin_run, Objective, SearchStrategy};
use crate::trial::{SearchState, StrategyOptions, StrategyPhase};

const DEFAULT_SEED: u64 = 1;

/// Random candidates scored by the acquisition function per guided probe.
const N_ACQUISITION_CANDIDATES: usize = 1000;

/// One probe of the optimizer: its position in the box, the target fed to
/// the surrogate, and the score returned when the probe was valid.
#[derive(Debug, Clone)]
struct Probe<S> {
    params: Vec<f64>,
    target: f64,
    score: Option<S>,
}

/// Gaussian-process guided search over the numeric encoding of the schema.
///
/// Of `max_runs`, a quarter (rounded down) are uniform random probes and three
/// times that many are guided by Expected Improvement.
pub struct BayesianStrategy<S> {
    schema: Arc<ConfigSchema>,
    domains: Vec<(f64, f64)>,
    init_points: usize,
    n_iter: usize,
    min_score: f64,
    rng: ChaCha8Rng,
    probes: Vec<Probe<S>>,
    state: SearchState<S>,
    phase: StrategyPhase,
}

impl<S: Aggregatable> BayesianStrategy<S> {
    pub fn new(
        schema: Arc<ConfigSchema>,
        max_runs: usize,
        options: &StrategyOptions,
    ) -> CwResult<Self> {
        let domains = schema
            .fields()
            .iter()
            .map(NumericEncoder::numeric_domain)
            .collect::<CwResult<Vec<_>>>()?;
        let init_points = max_runs / 4;
        Ok(Self {
            schema,
            domains,
            init_points,
            n_iter: init_points * 3,
            min_score: options.min_score,
            rng: ChaCha8Rng::seed_from_u64(options.seed.unwrap_or(DEFAULT_SEED)),
            probes: Vec::new(),
            state: SearchState::new(),
            phase: StrategyPhase::Constructed,
        })
    }

    /// Total number of probes the run will make.
    pub fn budget(&self) -> usize {
        self.init_points + self.n_iter
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Decode a box point into a configuration.
    fn decode(&self, params: &[f64]) -> Result<Configuration, ValidationError> {
        let values: Vec<(String, FieldValue)> = self
            .schema
            .fields()
            .iter()
            .zip(params)
            .map(|(field, &x)| (field.name.clone(), NumericEncoder::decode(field, x)))
            .collect();
        self.schema.build(values)
    }

    fn random_point(&mut self) -> Vec<f64> {
        let rng = &mut self.rng;
        self.domains
            .iter()
            .map(|&(lo, hi)| NumericEncoder::interpolate(lo, hi, rng.gen::<f64>()))
            .collect()
    }

    fn guided_point(&mut self) -> Vec<f64> {
        if self.probes.is_empty() {
            return self.random_point();
        }
        let x: Vec<Vec<f64>> = self.probes.iter().map(|p| self.normalize(&p.params)).collect();
        let y: Vec<f64> = self.probes.iter().map(|p| p.target).collect();
        match GaussianProcess::fit(&x, &y, DEFAULT_NOISE_VARIANCE) {
            Some(gp) => {
                let unit =
                    gp.maximize_acquisition(self.domains.len(), N_ACQUISITION_CANDIDATES, &mut self.rng);
                self.denormalize(&unit)
            }
            None => {
                warn!("Gaussian process fit failed; falling back to a random probe");
                self.random_point()
            }
        }
    }

    fn normalize(&self, params: &[f64]) -> Vec<f64> {
        params
            .iter()
            .zip(&self.domains)
            .map(|(&v, &(lo, hi))| NumericEncoder::unit_position(lo, hi, v))
            .collect()
    }

    fn denormalize(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(&self.domains)
            .map(|(&u, &(lo, hi))| NumericEncoder::interpolate(lo, hi, u))
            .collect()
    }

    /// Objective adaptor: the sentinel for invalid probes, otherwise the
    /// caller's score.
    async fn probe(&mut self, params: Vec<f64>, objective: &mut dyn Objective<S>) -> CwResult<()> {
        let probe = match self.decode(&params) {
            Ok(config) => {
                let score = objective.evaluate(&config).await?;
                debug!("Bayesian probe {} scored {:.6}", config, score.objective());
                Probe {
                    params,
                    target: score.objective(),
                    score: Some(score),
                }
            }
            Err(err) => {
                debug!("Bayesian probe rejected ({}); reporting {}", err, self.min_score);
                Probe {
                    params,
                    target: self.min_score,
                    score: None,
                }
            }
        };
        self.probes.push(probe);
        Ok(())
    }

    /// Rebuild typed records from the probe history, keeping only probes that
    /// re-validate.
    fn harvest(&mut self) {
        let probes = std::mem::take(&mut self.probes);
        for probe in &probes {
            if let (Ok(config), Some(score)) = (self.decode(&probe.params), &probe.score) {
                self.state.push(config, score.clone());
            }
        }
        info!(
            "Bayesian strategy harvested {} valid of {} probes",
            self.state.len(),
            probes.len()
        );
        self.probes = probes;
    }
}

#[async_trait]
impl<S: Aggregatable> SearchStrategy<S> for BayesianStrategy<S> {
    async fn run_strategy(&mut self, objective: &mut dyn Objective<S>) -> CwResult<()> {
        begin_run(&mut self.phase, "bayesian")?;
        for _ in 0..self.init_points {
            let params = self.random_point();
            self.probe(params, objective).await?;
        }
        for _ in 0..self.n_iter {
            let params = self.guided_point();
            self.probe(params, objective).await?;
        }
        self.harvest();
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
        "bayesian"
    }
}
