//! Statistical utility functions shared across modules
//!
//! Contains the summary statistics, grid helpers, and the small dense linear
//! solver used by the standardization, model selection and rescaling steps.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Population variance (divisor n), the convention used for residual variances
/// and for column standardization. Returns 0.0 for an empty slice.
pub fn population_variance(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let m = mean(x);
    x.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / x.len() as f64
}

/// `n` points spaced evenly between `start` and `stop` (both included).
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// `n` points spaced evenly on a log10 scale between `start` and `stop`.
/// Both bounds must be positive.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    linspace(start.log10(), stop.log10(), n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}

/// Solve a symmetric positive (semi-)definite system `A x = b` by Cholesky.
///
/// `a` is row-major `n x n`. Non-positive pivots are replaced by a tiny epsilon so
/// rank-deficient Gram matrices (collinear regulators) still yield a finite solution.
pub fn solve_symmetric_system(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut l = vec![0.0; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 0.0 {
                    sum = 1e-12;
                }
                l[i * n + j] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * y[j];
        }
        y[i] = sum / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

/// Ordinary least squares fit with an intercept
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub residuals: Array1<f64>,
}

/// Fit `y ~ 1 + X` by ordinary least squares.
///
/// The intercept is absorbed by centering `X` and `y`, so the normal equations
/// are solved on the centered Gram matrix only.
pub fn ordinary_least_squares(x: ArrayView2<f64>, y: ArrayView1<f64>) -> OlsFit {
    let (n_samples, n_coefs) = x.dim();

    let x_means = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(n_coefs));
    let y_mean = y.mean().unwrap_or(0.0);

    let mut xtx = vec![0.0; n_coefs * n_coefs];
    let mut xty = vec![0.0; n_coefs];
    for i in 0..n_samples {
        let yc = y[i] - y_mean;
        for j in 0..n_coefs {
            let xj = x[[i, j]] - x_means[j];
            for k in 0..n_coefs {
                xtx[j * n_coefs + k] += xj * (x[[i, k]] - x_means[k]);
            }
            xty[j] += xj * yc;
        }
    }

    let coefficients = if n_coefs == 0 {
        Vec::new()
    } else {
        solve_symmetric_system(&xtx, &xty, n_coefs)
    };
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(x_means.iter())
            .map(|(&b, &m)| b * m)
            .sum::<f64>();

    let residuals = Array1::from_shape_fn(n_samples, |i| {
        let fitted: f64 = intercept
            + (0..n_coefs)
                .map(|j| x[[i, j]] * coefficients[j])
                .sum::<f64>();
        y[i] - fitted
    });

    OlsFit {
        coefficients,
        intercept,
        residuals,
    }
}
