//! Mutable coefficient state carried across sweeps and across grid points

use ndarray::Array2;

use crate::error::{MtlError, Result};

/// Sparse (`s`) and block-sparse (`b`) coefficient matrices, each
/// n_features x n_tasks. The fitted weights are always `s + b`.
///
/// One state is threaded through every solver call of a gene's grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverState {
    s: Array2<f64>,
    b: Array2<f64>,
}

impl SolverState {
    /// Cold-start state: both components zero
    pub fn zeros(n_features: usize, n_tasks: usize) -> Self {
        Self {
            s: Array2::zeros((n_features, n_tasks)),
            b: Array2::zeros((n_features, n_tasks)),
        }
    }

    /// Build a state from explicit components (e.g. a saved warm start)
    pub fn from_parts(s: Array2<f64>, b: Array2<f64>) -> Result<Self> {
        if s.dim() != b.dim() {
            return Err(MtlError::shape(
                format!("block-sparse matrix of shape {:?}", s.dim()),
                format!("shape {:?}", b.dim()),
            ));
        }
        Ok(Self { s, b })
    }

    pub fn n_features(&self) -> usize {
        self.s.nrows()
    }

    pub fn n_tasks(&self) -> usize {
        self.s.ncols()
    }

    /// Sparse, task-specific component
    pub fn sparse(&self) -> &Array2<f64> {
        &self.s
    }

    /// Block-sparse, shared component
    pub fn block(&self) -> &Array2<f64> {
        &self.b
    }

    /// Current weights `W = S + B`
    pub fn weights(&self) -> Array2<f64> {
        &self.s + &self.b
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Array2<f64>, &mut Array2<f64>) {
        (&mut self.s, &mut self.b)
    }
}
