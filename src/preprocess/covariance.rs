//! Sufficient statistics for covariance-update coordinate descent

use ndarray::{Array1, Array2};

use crate::data::TaskData;

/// Cross-covariance vector and Gram matrix of one task.
///
/// Once built, coordinate descent never touches the raw samples again:
/// `c[j] = x_j . y` and `d[[j, l]] = x_j . x_l`.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceTerms {
    /// Response / design cross-products (length n_features)
    pub c: Array1<f64>,
    /// Gram matrix of the design (n_features x n_features)
    pub d: Array2<f64>,
}

impl CovarianceTerms {
    /// Build the terms for one (already standardized) task
    pub fn from_task(task: &TaskData) -> Self {
        let x = task.design();
        let y = task.response();
        Self {
            c: x.t().dot(&y),
            d: x.t().dot(&x),
        }
    }

    pub fn n_features(&self) -> usize {
        self.c.len()
    }
}

/// Build covariance terms for every task, in task order
pub fn covariance_terms(tasks: &[TaskData]) -> Vec<CovarianceTerms> {
    tasks.iter().map(CovarianceTerms::from_task).collect()
}
