//! Block coordinate descent for the Dirty Model
//!
//! The weight matrix W (features x tasks) is split into a sparse part S, lasso
//! penalized independently per task, and a block-sparse part B, penalized per
//! feature with an l1/l-inf norm across tasks. Both parts are updated by cyclic
//! coordinate descent on the covariance terms of each task, S first then B,
//! until the largest change in W drops below the tolerance.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};

use super::state::SolverState;
use super::SolverParams;
use crate::data::TaskData;
use crate::error::{MtlError, Result};
use crate::preprocess::{covariance_terms, CovarianceTerms};

/// Outcome of one solver run at fixed penalties
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyFit {
    /// `S + B` with entries below the weight floor set to zero
    pub weights: Array2<f64>,
    /// Number of S/B sweeps performed
    pub iterations: usize,
    /// Whether the last sweep moved W by less than the tolerance
    pub converged: bool,
    /// Largest absolute change in W during the last sweep
    pub max_update: f64,
}

/// Sign with `sign(0) = 0`, unlike `f64::signum`
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Unpenalized coordinate target for feature `j` of one task:
/// `(c_j - sum_i (held_i + free_i) * d_line_i) / d_jj`, where coordinate `j` of
/// the component being updated (`free`) is taken as zero.
///
/// A zero diagonal (constant regulator) contributes nothing.
#[inline]
fn coordinate_target(
    c_j: f64,
    d_jj: f64,
    d_line: ArrayView1<f64>,
    held: ArrayView1<f64>,
    free: ArrayView1<f64>,
    j: usize,
) -> f64 {
    if d_jj == 0.0 {
        return 0.0;
    }
    let mut fitted = 0.0;
    for i in 0..d_line.len() {
        let free_i = if i == j { 0.0 } else { free[i] };
        fitted += (held[i] + free_i) * d_line[i];
    }
    (c_j - fitted) / d_jj
}

/// One cyclic pass over the sparse component, task by task.
///
/// Updates are sequential: every coordinate sees the values written before it.
/// The threshold is one-sided, so a target at or below `lam_s` zeroes the entry.
pub fn update_sparse(terms: &[CovarianceTerms], state: &mut SolverState, lam_s: f64) {
    let (s, b) = state.parts_mut();
    for (k, t) in terms.iter().enumerate() {
        for j in 0..t.n_features() {
            let alpha = coordinate_target(t.c[j], t.d[[j, j]], t.d.row(j), b.column(k), s.column(k), j);
            s[[j, k]] = if alpha <= lam_s {
                0.0
            } else {
                alpha - sign(alpha) * lam_s
            };
        }
    }
}

/// One cyclic pass over the block-sparse component, feature by feature.
///
/// For each feature the per-task targets are computed from the current S and B,
/// then shrunk jointly with [`block_shrink`].
pub fn update_block(terms: &[CovarianceTerms], state: &mut SolverState, lam_b: f64) {
    let n_tasks = terms.len();
    let n_features = state.n_features();
    let (s, b) = state.parts_mut();
    let mut alphas = vec![0.0; n_tasks];

    for j in 0..n_features {
        for (k, t) in terms.iter().enumerate() {
            alphas[k] = coordinate_target(t.c[j], t.d[[j, j]], t.d.column(j), s.column(k), b.column(k), j);
        }
        for (k, value) in block_shrink(&alphas, lam_b).into_iter().enumerate() {
            b[[j, k]] = value;
        }
    }
}

/// Joint l1/l-inf shrinkage of one feature's per-task targets.
///
/// If the l1 norm of `alphas` is at most `lam`, the whole row is pruned.
/// Otherwise the magnitudes are ranked in descending order (equal magnitudes:
/// higher task index first) and `m*` is the first rank maximizing
/// `(cumsum_{0..=i} |a| - lam) / (i + 1)`. Ranks up to `m*` are set to
/// `sign(a) / (m* + 1) * (sum of the top m*+1 magnitudes - lam)`; the rest keep
/// their raw value.
pub fn block_shrink(alphas: &[f64], lam: f64) -> Vec<f64> {
    let n = alphas.len();
    let l1: f64 = alphas.iter().map(|a| a.abs()).sum();
    if l1 <= lam {
        return vec![0.0; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        alphas[b]
            .abs()
            .partial_cmp(&alphas[a].abs())
            .unwrap_or(Ordering::Equal)
            .then(b.cmp(&a))
    });

    let mut m_star = 0;
    let mut best = f64::NEG_INFINITY;
    let mut cumsum = 0.0;
    for (rank, &idx) in order.iter().enumerate() {
        cumsum += alphas[idx].abs();
        let score = (cumsum - lam) / (rank + 1) as f64;
        if score > best {
            best = score;
            m_star = rank;
        }
    }

    let top_sum: f64 = order[..=m_star].iter().map(|&idx| alphas[idx].abs()).sum();
    let excess = top_sum - lam;

    let mut shrunk = vec![0.0; n];
    for (rank, &idx) in order.iter().enumerate() {
        shrunk[idx] = if rank > m_star {
            alphas[idx]
        } else {
            (sign(alphas[idx]) / (m_star + 1) as f64) * excess
        };
    }
    shrunk
}

/// Dirty Model solver at fixed penalty strengths
#[derive(Debug, Clone, Default)]
pub struct DirtyModelSolver {
    params: SolverParams,
}

impl DirtyModelSolver {
    pub fn new(params: SolverParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Run coordinate descent from the given state, leaving the final S and B
    /// in `state` for the next (warm-started) call.
    ///
    /// Alternates [`update_sparse`] and [`update_block`] until
    /// `max |W_new - W_old|` falls below the tolerance or the iteration cap is
    /// reached; non-convergence is not an error. The returned weights have
    /// entries with magnitude below the weight floor zeroed. Fully deterministic.
    pub fn fit(
        &self,
        terms: &[CovarianceTerms],
        lam_b: f64,
        lam_s: f64,
        state: &mut SolverState,
    ) -> Result<DirtyFit> {
        validate_terms(terms, state)?;
        for (name, lam) in [("lamB", lam_b), ("lamS", lam_s)] {
            if !lam.is_finite() || lam < 0.0 {
                return Err(MtlError::InvalidInput {
                    reason: format!("{} must be finite and non-negative, got {}", name, lam),
                });
            }
        }

        let mut weights = state.weights();
        let mut iterations = 0;
        let mut converged = false;
        let mut max_update = f64::INFINITY;

        for iter in 0..self.params.max_iter {
            let previous = weights;
            update_sparse(terms, state, lam_s);
            update_block(terms, state, lam_b);
            weights = state.weights();

            max_update = weights
                .iter()
                .zip(previous.iter())
                .map(|(new, old)| (new - old).abs())
                .fold(0.0, f64::max);
            iterations = iter + 1;

            if max_update < self.params.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            log::debug!(
                "Dirty model did not converge in {} iterations (lamB={:.4}, lamS={:.4}, last update {:.3e})",
                iterations,
                lam_b,
                lam_s,
                max_update
            );
        }

        let floor = self.params.weight_floor;
        weights.mapv_inplace(|w| if w.abs() < floor { 0.0 } else { w });

        Ok(DirtyFit {
            weights,
            iterations,
            converged,
            max_update,
        })
    }

    /// Fit from a zero state, returning the final state alongside the fit
    pub fn fit_cold(&self, terms: &[CovarianceTerms], lam_b: f64, lam_s: f64) -> Result<(DirtyFit, SolverState)> {
        let n_features = terms.first().map(|t| t.n_features()).unwrap_or(0);
        let mut state = SolverState::zeros(n_features, terms.len());
        let fit = self.fit(terms, lam_b, lam_s, &mut state)?;
        Ok((fit, state))
    }

    /// Fit directly on (standardized) task data, building the covariance terms first
    pub fn fit_tasks(&self, tasks: &[TaskData], lam_b: f64, lam_s: f64) -> Result<(DirtyFit, SolverState)> {
        self.fit_cold(&covariance_terms(tasks), lam_b, lam_s)
    }
}

/// All tasks must agree on the feature count, and the state must be
/// n_features x n_tasks.
fn validate_terms(terms: &[CovarianceTerms], state: &SolverState) -> Result<()> {
    if terms.is_empty() {
        return Err(MtlError::EmptyData {
            reason: "no tasks to fit".to_string(),
        });
    }
    let n_features = terms[0].n_features();
    for (k, t) in terms.iter().enumerate() {
        if t.n_features() != n_features || t.d.dim() != (n_features, n_features) {
            return Err(MtlError::shape(
                format!("{} features with a {}x{} Gram matrix", n_features, n_features, n_features),
                format!("{} features with a {:?} Gram matrix in task {}", t.n_features(), t.d.dim(), k),
            ));
        }
    }
    if state.n_features() != n_features || state.n_tasks() != terms.len() {
        return Err(MtlError::shape(
            format!("solver state of shape ({}, {})", n_features, terms.len()),
            format!("({}, {})", state.n_features(), state.n_tasks()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    /// Orthogonal, zero-mean design: standardized columns have x_j . x_l = 0
    fn orthogonal_design() -> Array2<f64> {
        array![
            [-2.0, 1.0, 1.0],
            [-1.0, -2.0, 0.0],
            [0.0, 0.0, -2.0],
            [1.0, 2.0, 0.0],
            [2.0, -1.0, 1.0]
        ]
    }

    fn standardized_tasks(responses: &[usize]) -> Vec<TaskData> {
        let tasks: Vec<TaskData> = responses
            .iter()
            .map(|&j| {
                let design = orthogonal_design();
                let response = design.column(j).to_owned();
                TaskData::new(design, response).unwrap()
            })
            .collect();
        crate::preprocess::standardize_tasks(&tasks)
    }

    fn terms_from(c: Vec<Vec<f64>>, d: Vec<Array2<f64>>) -> Vec<CovarianceTerms> {
        c.into_iter()
            .zip(d)
            .map(|(c, d)| CovarianceTerms { c: Array1::from(c), d })
            .collect()
    }

    #[test]
    fn test_block_shrink_prunes_small_rows() {
        assert_eq!(block_shrink(&[0.5, -0.25], 0.75), vec![0.0, 0.0]);
        assert_eq!(block_shrink(&[0.5, -0.25], 1.0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_block_shrink_first_maximizer() {
        // |a| sorted: 3, 1, 0.5 -> scores (3-2)/1 = 1, (4-2)/2 = 1, (4.5-2)/3 < 1
        // tie between ranks 0 and 1 resolves to rank 0
        let shrunk = block_shrink(&[3.0, -1.0, 0.5], 2.0);
        assert_eq!(shrunk, vec![1.0, -1.0, 0.5]);
    }

    #[test]
    fn test_block_shrink_common_magnitude() {
        // scores: (2-1)/1 = 1, (4-1)/2 = 1.5 -> both shrunk to 1.5 with their signs
        let shrunk = block_shrink(&[2.0, -2.0], 1.0);
        assert_eq!(shrunk, vec![1.5, -1.5]);

        // l1 norm of the result is l1(alphas) - lam when every entry is shrunk
        let alphas = [0.9, 1.0, 1.1];
        let shrunk = block_shrink(&alphas, 0.3);
        let l1: f64 = shrunk.iter().map(|v| v.abs()).sum();
        assert!((l1 - (3.0 - 0.3)).abs() < 1e-12, "l1 = {}", l1);
    }

    #[test]
    fn test_block_shrink_zero_penalty_is_identity() {
        let alphas = [0.7, -1.3, 0.2, 2.5];
        assert_eq!(block_shrink(&alphas, 0.0), alphas.to_vec());
    }

    #[test]
    fn test_update_block_without_penalty_is_least_squares() {
        // Single feature: the coordinate update is c / d in every task
        let terms = terms_from(
            vec![vec![3.0], vec![-2.0], vec![0.5]],
            vec![array![[2.0]], array![[4.0]], array![[1.0]]],
        );
        let mut state = SolverState::zeros(1, 3);
        update_block(&terms, &mut state, 0.0);
        assert_eq!(state.block(), &array![[1.5, -0.5, 0.5]]);
        assert!(state.sparse().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_update_sparse_large_penalty_zeroes_everything() {
        let tasks = standardized_tasks(&[0, 1]);
        let terms = covariance_terms(&tasks);
        let mut state = SolverState::from_parts(Array2::from_elem((3, 2), 0.3), Array2::from_elem((3, 2), -0.2)).unwrap();
        update_sparse(&terms, &mut state, 1e6);
        assert!(state.sparse().iter().all(|&v| v == 0.0));
        // B is untouched by the sparse sweep
        assert!(state.block().iter().all(|&v| v == -0.2));
    }

    #[test]
    fn test_degenerate_feature_contributes_nothing() {
        // Second feature has a zero diagonal
        let terms = terms_from(
            vec![vec![2.0, 5.0], vec![1.0, 5.0]],
            vec![array![[1.0, 0.0], [0.0, 0.0]], array![[1.0, 0.0], [0.0, 0.0]]],
        );
        let mut state = SolverState::zeros(2, 2);
        update_sparse(&terms, &mut state, 0.0);
        update_block(&terms, &mut state, 0.0);
        let w = state.weights();
        assert_eq!(w[[1, 0]], 0.0);
        assert_eq!(w[[1, 1]], 0.0);
        assert!(w.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let tasks = standardized_tasks(&[0, 1]);
        let solver = DirtyModelSolver::default();
        let (first, state_a) = solver.fit_tasks(&tasks, 0.3, 0.2).unwrap();
        let (second, state_b) = solver.fit_tasks(&tasks, 0.3, 0.2).unwrap();
        assert_eq!(first, second);
        assert_eq!(state_a, state_b);
    }

    #[test]
    fn test_weights_equal_sum_of_components_before_floor() {
        let tasks = standardized_tasks(&[0, 0]);
        let solver = DirtyModelSolver::default();
        let (fit, state) = solver.fit_tasks(&tasks, 0.05, 0.04).unwrap();
        let unfloored = state.weights();
        for (w, raw) in fit.weights.iter().zip(unfloored.iter()) {
            assert!(*w == 0.0 || w == raw);
        }
    }

    #[test]
    fn test_shared_signal_lands_in_block_component() {
        // Both tasks respond to regulator 0 only; lamS above every per-task target
        let tasks = standardized_tasks(&[0, 0]);
        let solver = DirtyModelSolver::default();
        let (fit, state) = solver.fit_tasks(&tasks, 0.1, 1.5).unwrap();
        assert!(fit.converged);
        for k in 0..2 {
            // (|1| + |1| - 0.1) / 2
            assert!((fit.weights[[0, k]] - 0.95).abs() < 1e-9, "w = {}", fit.weights[[0, k]]);
            assert_eq!(fit.weights[[1, k]], 0.0);
            assert_eq!(fit.weights[[2, k]], 0.0);
            assert_eq!(state.sparse()[[0, k]], 0.0);
            assert!((state.block()[[0, k]] - 0.95).abs() < 1e-9);
        }
    }

    #[test]
    fn test_distinct_signals_land_in_sparse_component() {
        // Task 0 responds to regulator 0, task 1 to regulator 1; lamB above every row's l1 norm
        let tasks = standardized_tasks(&[0, 1]);
        let solver = DirtyModelSolver::default();
        let (fit, state) = solver.fit_tasks(&tasks, 1.2, 0.6).unwrap();
        assert!(fit.converged);
        assert!(state.block().iter().all(|&v| v == 0.0));
        assert!((state.sparse()[[0, 0]] - 0.4).abs() < 1e-9);
        assert!((state.sparse()[[1, 1]] - 0.4).abs() < 1e-9);
        assert_eq!(fit.weights[[1, 0]], 0.0);
        assert_eq!(fit.weights[[0, 1]], 0.0);
    }

    #[test]
    fn test_warm_start_reuses_state() {
        let tasks = standardized_tasks(&[0, 0]);
        let terms = covariance_terms(&tasks);
        let solver = DirtyModelSolver::default();
        let (cold, mut state) = solver.fit_cold(&terms, 0.1, 0.09).unwrap();
        // Restarting from the converged state needs a single sweep
        let warm = solver.fit(&terms, 0.1, 0.09, &mut state).unwrap();
        assert_eq!(warm.iterations, 1);
        assert!(cold.iterations >= warm.iterations);
    }

    #[test]
    fn test_shape_and_penalty_validation() {
        let tasks = standardized_tasks(&[0, 1]);
        let terms = covariance_terms(&tasks);
        let solver = DirtyModelSolver::default();

        let mut wrong = SolverState::zeros(2, 2);
        assert!(matches!(
            solver.fit(&terms, 0.1, 0.05, &mut wrong),
            Err(MtlError::ShapeMismatch { .. })
        ));
        assert!(matches!(solver.fit_cold(&terms, -1.0, 0.05), Err(MtlError::InvalidInput { .. })));
        assert!(matches!(solver.fit_cold(&[], 0.1, 0.05), Err(MtlError::EmptyData { .. })));
    }
}
