//! Warm-started grid search over (lamB, lamS) scored by EBIC

use log::{debug, trace};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::ebic::ebic;
use super::SelectionParams;
use crate::data::TaskData;
use crate::error::{MtlError, Result};
use crate::preprocess::{covariance_terms, CovarianceTerms};
use crate::solver::{DirtyModelSolver, SolverParams, SolverState};
use crate::stats::mean;

/// Score of one visited grid point, in traversal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridScore {
    pub lam_b: f64,
    pub lam_s: f64,
    pub ebic: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimum-EBIC model found by the grid search
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected weights (features x tasks)
    pub weights: Array2<f64>,
    pub lam_b: f64,
    pub lam_s: f64,
    pub ebic: f64,
    /// Position of the selected point in `path`
    pub grid_index: usize,
    /// Every visited point; shorter than the full grid if a perfect fit stopped the search
    pub path: Vec<GridScore>,
}

/// Data-driven lamB baseline: `sqrt(n_tasks * ln(n_features) / mean(n_samples))`
pub fn lam_b_baseline(n_tasks: usize, n_features: usize, n_samples: &[usize]) -> f64 {
    let samples: Vec<f64> = n_samples.iter().map(|&n| n as f64).collect();
    let mean_samples = mean(&samples);
    if mean_samples <= 0.0 || n_features == 0 {
        return 0.0;
    }
    ((n_tasks as f64 * (n_features as f64).ln()) / mean_samples).sqrt()
}

/// Selects penalty strengths for the Dirty Model by EBIC.
///
/// Grid traversal order: the outer loop walks `lam_b_scales` in slice order, the
/// inner loop walks `lam_s_scales` in slice order, and lamS at each point is
/// `lam_s_scale * lamB`. One solver state is threaded through the entire walk,
/// across outer steps too, so every fit is warm-started from the previous one.
/// The walk is strictly sequential. Equal scores keep the earlier point.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    solver: DirtyModelSolver,
    params: SelectionParams,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            solver: DirtyModelSolver::default(),
            params: SelectionParams::default(),
        }
    }
}

impl ModelSelector {
    pub fn new(solver_params: SolverParams, params: SelectionParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            solver: DirtyModelSolver::new(solver_params)?,
            params,
        })
    }

    pub fn params(&self) -> &SelectionParams {
        &self.params
    }

    /// The (lamB, lamS) pairs in traversal order for a given baseline
    pub fn grid(&self, lam_b_base: f64) -> Vec<(f64, f64)> {
        self.params
            .lam_b_scales
            .iter()
            .flat_map(|&c| {
                let lam_b = c * lam_b_base;
                self.params.lam_s_scales.iter().map(move |&s| (lam_b, s * lam_b))
            })
            .collect()
    }

    /// Run the grid search on standardized task data
    pub fn select(&self, tasks: &[TaskData]) -> Result<Selection> {
        let terms = covariance_terms(tasks);
        self.select_with_terms(tasks, &terms)
    }

    /// Run the grid search with precomputed covariance terms (one per task)
    pub fn select_with_terms(&self, tasks: &[TaskData], terms: &[CovarianceTerms]) -> Result<Selection> {
        if tasks.is_empty() {
            return Err(MtlError::EmptyData {
                reason: "no tasks for model selection".to_string(),
            });
        }
        if terms.len() != tasks.len() {
            return Err(MtlError::shape(
                format!("{} covariance terms (one per task)", tasks.len()),
                format!("{}", terms.len()),
            ));
        }
        let n_features = tasks[0].n_features();
        for (k, (task, term)) in tasks.iter().zip(terms.iter()).enumerate() {
            if task.n_features() != n_features || term.n_features() != n_features {
                return Err(MtlError::shape(
                    format!("{} features in every task and covariance term", n_features),
                    format!(
                        "{} design columns and {} covariance features in task {}",
                        task.n_features(),
                        term.n_features(),
                        k
                    ),
                ));
            }
        }

        let n_tasks = tasks.len();
        let n_samples: Vec<usize> = tasks.iter().map(|t| t.n_samples()).collect();
        let lam_b_base = lam_b_baseline(n_tasks, n_features, &n_samples);
        let gamma = self.params.gamma;

        let mut state = SolverState::zeros(n_features, n_tasks);
        let mut path = Vec::with_capacity(self.params.n_points());
        let mut best: Option<(usize, Array2<f64>)> = None;
        let mut best_score = f64::INFINITY;

        for (index, (lam_b, lam_s)) in self.grid(lam_b_base).into_iter().enumerate() {
            let fit = self.solver.fit(terms, lam_b, lam_s, &mut state)?;
            let score = ebic(tasks, &fit.weights, gamma)?;
            trace!(
                "grid point {}: lamB={:.5} lamS={:.5} ebic={:.4} iterations={}",
                index,
                lam_b,
                lam_s,
                score,
                fit.iterations
            );

            path.push(GridScore {
                lam_b,
                lam_s,
                ebic: score,
                iterations: fit.iterations,
                converged: fit.converged,
            });

            if (best.is_none() && !score.is_nan()) || score < best_score {
                best_score = score;
                best = Some((index, fit.weights));
            }

            if score == f64::NEG_INFINITY {
                debug!("Perfect fit at grid point {} (lamB={:.5}), stopping grid search", index, lam_b);
                break;
            }
        }

        let (grid_index, weights) = best.ok_or_else(|| MtlError::NumericalInstability {
            operation: "EBIC model selection".to_string(),
            details: "no grid point produced a comparable score".to_string(),
        })?;
        let chosen = &path[grid_index];

        Ok(Selection {
            weights,
            lam_b: chosen.lam_b,
            lam_s: chosen.lam_s,
            ebic: chosen.ebic,
            grid_index,
            path,
        })
    }
}
