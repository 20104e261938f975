//! Search telemetry: structured events delivered to pluggable sinks.
//!
//! A [`Telemetry`] handle is opened per search run and closed when the run
//! ends. Sinks decide where events go: the `tracing` pipeline, an in-memory
//! log, or a channel consumed elsewhere.

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cw_optimizer::{SearchId, SearchRunState, SearchStatus};
use cw_types::Configuration;

/// Events emitted during a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    SearchStarted {
        run_id: SearchId,
        strategy: String,
        runner: String,
        max_runs: usize,
    },
    CandidateEvaluated {
        run_id: SearchId,
        trial_number: usize,
        config: serde_json::Value,
        objective: f64,
        elapsed_ms: u64,
    },
    SearchFinished {
        run_id: SearchId,
        state: SearchRunState,
        candidates_evaluated: usize,
        best_objective: Option<f64>,
        error: Option<String>,
    },
}

/// Destination for search events.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &SearchEvent);

    fn flush(&self) {}
}

/// Forwards events to the `tracing` pipeline. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: &SearchEvent) {
        match event {
            SearchEvent::SearchStarted {
                run_id,
                strategy,
                runner,
                max_runs,
            } => info!(
                "Search {} started: strategy={}, runner={}, max_runs={}",
                run_id, strategy, runner, max_runs
            ),
            SearchEvent::CandidateEvaluated {
                trial_number,
                config,
                objective,
                elapsed_ms,
                ..
            } => debug!(
                "Candidate #{} scored {:.6} in {} ms: {}",
                trial_number, objective, elapsed_ms, config
            ),
            SearchEvent::SearchFinished {
                run_id,
                state,
                candidates_evaluated,
                best_objective,
                error,
            } => match error {
                Some(error) => warn!(
                    "Search {} {:?} after {} candidates: {}",
                    run_id, state, candidates_evaluated, error
                ),
                None => info!(
                    "Search {} {:?}: {} candidates, best objective {:?}",
                    run_id, state, candidates_evaluated, best_objective
                ),
            },
        }
    }
}

/// One entry of a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEntry {
    pub timestamp: DateTime<Utc>,
    /// Seconds since the previous entry (zero for the first).
    pub time_elapsed: f64,
    pub event: SearchEvent,
}

/// Keeps every event in memory, stamped with the time since the previous one.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<TelemetryEntry>>,
    last: Mutex<Option<Instant>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TelemetryEntry> {
        self.entries.lock().clone()
    }

    pub fn events(&self) -> Vec<SearchEvent> {
        self.entries.lock().iter().map(|e| e.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Entries as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&*self.entries.lock())
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, event: &SearchEvent) {
        let now = Instant::now();
        let time_elapsed = {
            let mut last = self.last.lock();
            let elapsed = last.map(|t| now.duration_since(t).as_secs_f64()).unwrap_or(0.0);
            *last = Some(now);
            elapsed
        };
        self.entries.lock().push(TelemetryEntry {
            timestamp: Utc::now(),
            time_elapsed,
            event: event.clone(),
        });
    }
}

/// Sends events over a crossbeam channel. Events are dropped once the
/// receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<SearchEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SearchEvent>) -> Self {
        Self { tx }
    }
}

impl TelemetrySink for ChannelSink {
    fn record(&self, event: &SearchEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!("Telemetry receiver disconnected; dropping event");
        }
    }
}

/// Per-run telemetry handle.
pub struct Telemetry {
    run_id: SearchId,
    sink: Arc<dyn TelemetrySink>,
    opened_at: Instant,
}

impl Telemetry {
    pub fn open(run_id: SearchId, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            run_id,
            sink,
            opened_at: Instant::now(),
        }
    }

    pub fn run_id(&self) -> SearchId {
        self.run_id
    }

    pub fn search_started(&self, status: &SearchStatus) {
        self.sink.record(&SearchEvent::SearchStarted {
            run_id: self.run_id,
            strategy: status.strategy.clone(),
            runner: status.runner.clone(),
            max_runs: status.max_runs,
        });
    }

    pub fn candidate_evaluated(
        &self,
        trial_number: usize,
        config: &Configuration,
        objective: f64,
        elapsed: Duration,
    ) {
        self.sink.record(&SearchEvent::CandidateEvaluated {
            run_id: self.run_id,
            trial_number,
            config: config.to_json(),
            objective,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }

    pub fn search_finished(&self, status: &SearchStatus) {
        self.sink.record(&SearchEvent::SearchFinished {
            run_id: self.run_id,
            state: status.state,
            candidates_evaluated: status.candidates_evaluated,
            best_objective: status.best_objective,
            error: status.error.clone(),
        });
    }

    /// Flush the sink and end the run.
    pub fn close(self) {
        debug!(
            "Closing telemetry for run {} after {:?}",
            self.run_id,
            self.opened_at.elapsed()
        );
        self.sink.flush();
    }
}

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`. Later calls are
/// no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
