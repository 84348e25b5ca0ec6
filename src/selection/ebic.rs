//! Extended Bayesian Information Criterion for multi-task weight matrices

use ndarray::{Array2, ArrayView1};
use statrs::function::factorial::ln_binomial;

use crate::data::TaskData;
use crate::error::{MtlError, Result};

/// Residual sum of squares of one task under the weight column `w`
pub fn residual_sum_of_squares(task: &TaskData, w: ArrayView1<f64>) -> f64 {
    let predicted = task.design().dot(&w);
    task.response()
        .iter()
        .zip(predicted.iter())
        .map(|(y, p)| (y - p) * (y - p))
        .sum()
}

/// EBIC of one task:
/// `n log(RSS / n) + p log(n) + 2 gamma log C(n_candidates, p)`,
/// with `p` the number of nonzero weights.
///
/// A perfect fit (RSS = 0) scores negative infinity.
pub fn task_ebic(task: &TaskData, w: ArrayView1<f64>, n_candidates: usize, gamma: f64) -> f64 {
    let n = task.n_samples() as f64;
    let rss = residual_sum_of_squares(task, w);
    if rss <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let nonzero = w.iter().filter(|&&v| v != 0.0).count();
    let bic_penalty = nonzero as f64 * n.ln();
    let extension = 2.0 * gamma * ln_binomial(n_candidates as u64, nonzero as u64);

    n * (rss / n).ln() + bic_penalty + extension
}

/// Mean per-task EBIC of a weight matrix (features x tasks). Lower is better.
pub fn ebic(tasks: &[TaskData], weights: &Array2<f64>, gamma: f64) -> Result<f64> {
    if tasks.is_empty() {
        return Err(MtlError::EmptyData {
            reason: "no tasks to score".to_string(),
        });
    }
    let n_features = tasks[0].n_features();
    if let Some((k, task)) = tasks.iter().enumerate().find(|(_, t)| t.n_features() != n_features) {
        return Err(MtlError::shape(
            format!("{} design columns in every task", n_features),
            format!("{} in task {}", task.n_features(), k),
        ));
    }
    if weights.dim() != (n_features, tasks.len()) {
        return Err(MtlError::shape(
            format!("weights of shape ({}, {})", n_features, tasks.len()),
            format!("{:?}", weights.dim()),
        ));
    }

    let total: f64 = tasks
        .iter()
        .enumerate()
        .map(|(k, task)| task_ebic(task, weights.column(k), n_features, gamma))
        .sum();
    Ok(total / tasks.len() as f64)
}
