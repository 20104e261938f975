//! # cw-engine
//!
//! Finds the configuration of a user program that scores best on a dataset.
//!
//! Provides the program and scoring contracts, score aggregation, the
//! concurrent evaluation runner, search configuration, telemetry sinks and the
//! [`SearchEngine`] that ties a search strategy to the runner.

pub mod aggregation;
pub mod config;
pub mod engine;
pub mod program;
pub mod runner;
pub mod scoring;
pub mod telemetry;

pub use aggregation::Aggregation;
pub use config::{SearchConfig, DEFAULT_MAX_RUNS};
pub use engine::{SearchEngine, SearchReport};
pub use program::{Dataset, Program};
pub use runner::{EvaluationRunner, RunnerKind, RunnerOptions};
pub use scoring::{score_sample, PairScorer, PredictionScorer, ScoringFunction};
pub use telemetry::{
    init_tracing, ChannelSink, MemorySink, SearchEvent, Telemetry, TelemetryEntry, TelemetrySink,
    TracingSink,
};
