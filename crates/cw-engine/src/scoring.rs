//! Scoring functions and the arity fallback.

use std::marker::PhantomData;

use cw_types::ScoringError;

/// Turns a program output into a score.
///
/// Implementors provide the two-argument form, the prediction-only form, or
/// both. Whichever form is missing reports [`ScoringError::ArityMismatch`].
pub trait ScoringFunction<O, S>: Send + Sync {
    fn score(&self, _predicted: &O, _expected: &O) -> Result<S, ScoringError> {
        Err(ScoringError::ArityMismatch)
    }

    fn score_prediction(&self, _predicted: &O) -> Result<S, ScoringError> {
        Err(ScoringError::ArityMismatch)
    }
}

/// Score one sample, falling back to the prediction-only form when the
/// two-argument form is not accepted.
pub fn score_sample<O, S>(
    scoring: &dyn ScoringFunction<O, S>,
    predicted: &O,
    expected: &O,
) -> Result<S, ScoringError> {
    match scoring.score(predicted, expected) {
        Err(ScoringError::ArityMismatch) => scoring.score_prediction(predicted),
        other => other,
    }
}

/// Two-argument scorer from a closure `(predicted, expected) -> score`.
pub struct PairScorer<F> {
    f: F,
}

impl<F> PairScorer<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<O, S, F> ScoringFunction<O, S> for PairScorer<F>
where
    F: Fn(&O, &O) -> S + Send + Sync,
{
    fn score(&self, predicted: &O, expected: &O) -> Result<S, ScoringError> {
        Ok((self.f)(predicted, expected))
    }
}

/// Prediction-only scorer from a closure `predicted -> score`.
pub struct PredictionScorer<O, F> {
    f: F,
    _output: PhantomData<fn(&O)>,
}

impl<O, F> PredictionScorer<O, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _output: PhantomData,
        }
    }
}

impl<O, S, F> ScoringFunction<O, S> for PredictionScorer<O, F>
where
    F: Fn(&O) -> S + Send + Sync,
{
    fn score_prediction(&self, predicted: &O) -> Result<S, ScoringError> {
        Ok((self.f)(predicted))
    }
}
