//! Reducing per-sample scores to one aggregate score.

use serde::{Deserialize, Serialize};

use cw_types::{mean, Aggregatable, EvaluationError};

/// How a runner combines the per-sample scores of one configuration.
///
/// Scores arrive in dataset order; every variant is order independent except
/// `WeightedMean`, whose weights are matched to samples by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Aggregation {
    /// Arithmetic mean.
    #[default]
    AllMean,
    /// Lowest score.
    WorstCase,
    /// Linearly interpolated percentile, `q` in `[0, 100]`.
    Percentile(f64),
    /// Weighted mean with one non-negative weight per sample.
    WeightedMean(Vec<f64>),
}

impl Aggregation {
    pub fn median() -> Self {
        Self::Percentile(50.0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AllMean => "all_mean",
            Self::WorstCase => "worst_case",
            Self::Percentile(_) => "percentile",
            Self::WeightedMean(_) => "weighted_mean",
        }
    }

    pub fn aggregate<S: Aggregatable>(&self, scores: &[S]) -> Result<S, EvaluationError> {
        if scores.is_empty() {
            return Err(EvaluationError::EmptyDataset);
        }
        match self {
            Self::AllMean => mean(scores).ok_or(EvaluationError::EmptyDataset),
            Self::WorstCase => Ok(scores
                .iter()
                .skip(1)
                .fold(&scores[0], |worst, s| {
                    if s.compare(worst).is_lt() {
                        s
                    } else {
                        worst
                    }
                })
                .clone()),
            Self::Percentile(q) => percentile(scores, *q),
            Self::WeightedMean(weights) => weighted_mean(scores, weights),
        }
    }
}

fn percentile<S: Aggregatable>(scores: &[S], q: f64) -> Result<S, EvaluationError> {
    if !(0.0..=100.0).contains(&q) {
        return Err(EvaluationError::Aggregation {
            message: format!("percentile {q} outside [0, 100]"),
        });
    }
    let mut sorted: Vec<&S> = scores.iter().collect();
    sorted.sort_by(|a, b| a.compare(b));

    let position = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    if lower == upper || fraction == 0.0 {
        return Ok(sorted[lower].clone());
    }
    let span = sorted[upper].difference(sorted[lower]);
    Ok(sorted[lower].combine(&span.scale(fraction)))
}

fn weighted_mean<S: Aggregatable>(scores: &[S], weights: &[f64]) -> Result<S, EvaluationError> {
    if weights.len() != scores.len() {
        return Err(EvaluationError::Aggregation {
            message: format!(
                "{} weights for {} samples",
                weights.len(),
                scores.len()
            ),
        });
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(EvaluationError::Aggregation {
            message: "weights must be finite and non-negative".to_string(),
        });
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(EvaluationError::Aggregation {
            message: "weights sum to zero".to_string(),
        });
    }
    let weighted = scores
        .iter()
        .zip(weights)
        .fold(S::zero(), |acc, (s, w)| acc.combine(&s.scale(*w)));
    Ok(weighted.scale(1.0 / total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_types::MetricScore;

    #[test]
    fn mean_of_identical_scores_is_that_score() {
        let score = Aggregation::AllMean.aggregate(&[1.0, 1.0, 1.0]).unwrap();
        assert!((score - 1.0f64).abs() < 1e-12);
    }

    #[test]
    fn worst_case_takes_minimum() {
        let score = Aggregation::WorstCase.aggregate(&[0.7, 0.2, 0.9]).unwrap();
        assert_eq!(score, 0.2);
    }

    #[test]
    fn median_interpolates_even_counts() {
        assert_eq!(Aggregation::median().aggregate(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        let even = Aggregation::median().aggregate(&[4.0, 1.0, 2.0, 3.0]).unwrap();
        assert!((even - 2.5f64).abs() < 1e-12);
    }

    #[test]
    fn percentile_extremes_are_min_and_max() {
        let scores = [5.0, -1.0, 3.0];
        assert_eq!(Aggregation::Percentile(0.0).aggregate(&scores).unwrap(), -1.0);
        assert_eq!(Aggregation::Percentile(100.0).aggregate(&scores).unwrap(), 5.0);
        assert!(matches!(
            Aggregation::Percentile(101.0).aggregate(&scores),
            Err(EvaluationError::Aggregation { .. })
        ));
    }

    #[test]
    fn weighted_mean_respects_weights() {
        let agg = Aggregation::WeightedMean(vec![3.0, 1.0]);
        let score = agg.aggregate(&[1.0, 5.0]).unwrap();
        assert!((score - 2.0f64).abs() < 1e-12);
        assert!(Aggregation::WeightedMean(vec![1.0]).aggregate(&[1.0, 2.0]).is_err());
        assert!(Aggregation::WeightedMean(vec![0.0, 0.0]).aggregate(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn empty_input_is_an_error() {
        let empty: [f64; 0] = [];
        for agg in [Aggregation::AllMean, Aggregation::WorstCase, Aggregation::median()] {
            assert!(matches!(agg.aggregate(&empty), Err(EvaluationError::EmptyDataset)));
        }
    }

    #[test]
    fn structured_scores_aggregate_per_metric() {
        let scores = vec![
            MetricScore::new(1.0).with_metric("latency_ms", 10.0),
            MetricScore::new(0.0).with_metric("latency_ms", 30.0),
        ];
        let mean = Aggregation::AllMean.aggregate(&scores).unwrap();
        assert!((mean.objective - 0.5).abs() < 1e-12);
        assert_eq!(mean.metric("latency_ms"), Some(20.0));

        let worst = Aggregation::WorstCase.aggregate(&scores).unwrap();
        assert_eq!(worst.objective, 0.0);
    }
}
