//! Score values and the capability needed to aggregate and compare them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Operations a score representation must support so runners can average
/// per-sample scores and strategies can rank configurations.
pub trait Aggregatable: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Neutral element of [`Aggregatable::combine`].
    fn zero() -> Self;

    fn combine(&self, other: &Self) -> Self;

    fn difference(&self, other: &Self) -> Self;

    fn scale(&self, factor: f64) -> Self;

    fn compare(&self, other: &Self) -> Ordering;

    /// Scalar projection, used by model-based strategies and telemetry.
    fn objective(&self) -> f64;
}

macro_rules! impl_aggregatable_float {
    ($($t:ty),*) => {$(
        impl Aggregatable for $t {
            fn zero() -> Self {
                0.0
            }

            fn combine(&self, other: &Self) -> Self {
                self + other
            }

            fn difference(&self, other: &Self) -> Self {
                self - other
            }

            fn scale(&self, factor: f64) -> Self {
                (*self as f64 * factor) as $t
            }

            fn compare(&self, other: &Self) -> Ordering {
                self.partial_cmp(other).unwrap_or(Ordering::Equal)
            }

            fn objective(&self) -> f64 {
                *self as f64
            }
        }
    )*};
}

impl_aggregatable_float!(f32, f64);

/// Arithmetic mean of `scores`, or `None` for an empty slice.
pub fn mean<S: Aggregatable>(scores: &[S]) -> Option<S> {
    if scores.is_empty() {
        return None;
    }
    let total = scores.iter().fold(S::zero(), |acc, s| acc.combine(s));
    Some(total.scale(1.0 / scores.len() as f64))
}

/// Multi-metric score ranked on its `objective` dimension.
///
/// Additional metrics (cost, latency, ...) travel with the objective and are
/// aggregated element-wise, so a mean over samples yields per-metric means.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricScore {
    pub objective: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl MetricScore {
    pub fn new(objective: f64) -> Self {
        Self {
            objective,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    fn zip_with(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        let mut metrics = self.metrics.clone();
        for (name, value) in &other.metrics {
            let entry = metrics.entry(name.clone()).or_insert(0.0);
            *entry = op(*entry, *value);
        }
        Self {
            objective: op(self.objective, other.objective),
            metrics,
        }
    }
}

impl Aggregatable for MetricScore {
    fn zero() -> Self {
        Self::default()
    }

    fn combine(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    fn difference(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            objective: self.objective * factor,
            metrics: self
                .metrics
                .iter()
                .map(|(k, v)| (k.clone(), v * factor))
                .collect(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.objective
            .partial_cmp(&other.objective)
            .unwrap_or(Ordering::Equal)
    }

    fn objective(&self) -> f64 {
        self.objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_equal_scores() {
        assert_eq!(mean(&[1.0_f64, 1.0, 1.0]), Some(1.0));
        assert_eq!(mean::<f64>(&[]), None);
    }

    #[test]
    fn f32_scores_aggregate() {
        let m = mean(&[0.5_f32, 1.5]).unwrap();
        assert!((m - 1.0).abs() < 1e-6);
        assert_eq!(2.0_f32.difference(&0.5), 1.5);
    }

    #[test]
    fn metric_score_means_every_dimension() {
        let a = MetricScore::new(1.0).with_metric("cost", 4.0);
        let b = MetricScore::new(0.0).with_metric("cost", 2.0).with_metric("latency", 6.0);
        let m = mean(&[a, b]).unwrap();
        assert_eq!(m.objective, 0.5);
        assert_eq!(m.metric("cost"), Some(3.0));
        assert_eq!(m.metric("latency"), Some(3.0));
    }

    #[test]
    fn metric_score_ranks_on_objective_only() {
        let cheap = MetricScore::new(0.4).with_metric("cost", 1.0);
        let good = MetricScore::new(0.9).with_metric("cost", 100.0);
        assert_eq!(good.compare(&cheap), Ordering::Greater);
        assert_eq!(good.difference(&cheap).objective(), 0.9 - 0.4);
    }
}
