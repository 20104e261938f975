//! # cw-optimizer
//!
//! Search strategies over typed configuration schemas.
//!
//! Provides the numeric encoding of fields, representative-value pools and
//! their Cartesian products, the grid, random and Bayesian strategies, and the
//! per-run search state and status tracking.

mod bayesian;
mod cartesian;
mod encoding;
mod gp;
mod grid;
mod random;
mod search;
mod trial;

pub use bayesian::BayesianStrategy;
pub use cartesian::{CartesianPools, ShuffledPoints, MAX_ENUMERATED_POINTS};
pub use encoding::{NumericEncoder, FLOAT_EPSILON};
pub use gp::{GaussianProcess, DEFAULT_NOISE_VARIANCE};
pub use grid::GridStrategy;
pub use random::RandomStrategy;
pub use search::{build_strategy, FnObjective, Objective, SearchStrategy, StrategyKind};
pub use trial::{
    EvaluationRecord, SearchId, SearchRunState, SearchState, SearchStatus, StrategyOptions,
    StrategyPhase, DEFAULT_MIN_SCORE,
};
