//! Gaussian-process surrogate with a Matérn 5/2 kernel and Expected
//! Improvement acquisition, for maximization over the unit cube.
//!
//! Inputs are expected in `[0, 1]^d`. Targets are standardized before
//! fitting, lengthscales follow the per-dimension spread of the training
//! inputs (ARD), and the signal variance is fixed at one.

use nalgebra::{DMatrix, DVector};
use rand::Rng;

/// Observation noise added to the kernel diagonal.
pub const DEFAULT_NOISE_VARIANCE: f64 = 1e-6;

/// Most recent observations used for fitting; bounds the O(n³) Cholesky cost.
pub const MAX_TRAIN_POINTS: usize = 200;

const SQRT_5: f64 = 2.236_067_977_499_79;
const MIN_LENGTHSCALE: f64 = 0.01;

/// A fitted GP ready for predictions.
pub struct GaussianProcess {
    cholesky: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
    alpha: DVector<f64>,
    x_train: Vec<Vec<f64>>,
    lengthscales: Vec<f64>,
    /// Best standardized target seen.
    f_best: f64,
}

impl GaussianProcess {
    /// Fit to `(x, y)` pairs. Returns `None` with no data or when the kernel
    /// matrix is not positive definite.
    pub fn fit(x: &[Vec<f64>], y: &[f64], noise_variance: f64) -> Option<Self> {
        let start = x.len().saturating_sub(MAX_TRAIN_POINTS);
        let (x, y) = (&x[start..], &y[start..]);
        let n = y.len();
        if n == 0 || x.len() != n {
            return None;
        }

        let y_mean = y.iter().sum::<f64>() / n as f64;
        let y_var = if n > 1 {
            y.iter().map(|v| (v - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            1.0
        };
        let y_std = y_var.sqrt().max(1e-10);
        let standardized: Vec<f64> = y.iter().map(|v| (v - y_mean) / y_std).collect();
        let f_best = standardized.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let dims = x[0].len();
        let lengthscales: Vec<f64> = (0..dims)
            .map(|j| {
                let mean = x.iter().map(|p| p[j]).sum::<f64>() / n as f64;
                let var = x.iter().map(|p| (p[j] - mean).powi(2)).sum::<f64>() / n as f64;
                var.sqrt().max(MIN_LENGTHSCALE)
            })
            .collect();

        let kernel = DMatrix::from_fn(n, n, |i, j| {
            let k = matern52(&x[i], &x[j], &lengthscales);
            if i == j {
                k + noise_variance
            } else {
                k
            }
        });
        let cholesky = nalgebra::linalg::Cholesky::new(kernel)?;
        let alpha = cholesky.solve(&DVector::from_column_slice(&standardized));

        Some(Self {
            cholesky,
            alpha,
            x_train: x.to_vec(),
            lengthscales,
            f_best,
        })
    }

    /// Posterior mean and standard deviation (standardized units).
    pub fn predict(&self, x: &[f64]) -> (f64, f64) {
        let k_star = DVector::from_fn(self.x_train.len(), |i, _| {
            matern52(x, &self.x_train[i], &self.lengthscales)
        });
        let mean = k_star.dot(&self.alpha);
        let v = self.cholesky.solve(&k_star);
        let var = (1.0 - k_star.dot(&v)).max(0.0);
        (mean, var.sqrt())
    }

    /// Expected improvement over the best observation at `x`.
    pub fn expected_improvement(&self, x: &[f64]) -> f64 {
        let (mean, std) = self.predict(x);
        let gain = mean - self.f_best;
        if std < 1e-12 {
            return gain.max(0.0);
        }
        let z = gain / std;
        (gain * norm_cdf(z) + std * norm_pdf(z)).max(0.0)
    }

    /// Point of `[0, 1]^dims` with the highest EI among `n_candidates`
    /// uniform draws.
    pub fn maximize_acquisition<R: Rng + ?Sized>(
        &self,
        dims: usize,
        n_candidates: usize,
        rng: &mut R,
    ) -> Vec<f64> {
        let mut best_ei = f64::NEG_INFINITY;
        let mut best_x = vec![0.5; dims];
        for _ in 0..n_candidates {
            let candidate: Vec<f64> = (0..dims).map(|_| rng.gen::<f64>()).collect();
            let ei = self.expected_improvement(&candidate);
            if ei > best_ei {
                best_ei = ei;
                best_x = candidate;
            }
        }
        best_x
    }
}

/// `k(a, b) = (1 + √5 r + 5/3 r²) exp(-√5 r)` with ARD-scaled distance `r`.
fn matern52(a: &[f64], b: &[f64], lengthscales: &[f64]) -> f64 {
    let r_sq: f64 = a
        .iter()
        .zip(b)
        .zip(lengthscales)
        .map(|((x1, x2), l)| ((x1 - x2) / l).powi(2))
        .sum();
    let r = r_sq.sqrt();
    (1.0 + SQRT_5 * r + 5.0 / 3.0 * r_sq) * (-SQRT_5 * r).exp()
}

fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

// Zelen & Severo polynomial approximation, |error| < 7.5e-8.
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let upper = norm_pdf(x.abs()) * poly;
    if x >= 0.0 {
        1.0 - upper
    } else {
        upper
    }
}
