//! Dirty Model (sparse + block-sparse) multi-task solver

mod dirty;
mod state;

pub use dirty::{block_shrink, update_block, update_sparse, DirtyFit, DirtyModelSolver};
pub use state::SolverState;

use crate::error::{MtlError, Result};

/// Configurable parameters for the coordinate-descent solver.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Maximum number of S/B sweeps per fit
    pub max_iter: usize,
    /// Stop once `max |W_new - W_old|` falls below this
    pub tolerance: f64,
    /// Weights with smaller magnitude are zeroed after the fit
    pub weight_floor: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-2,
            weight_floor: 0.1,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(MtlError::InvalidInput {
                reason: "max_iter must be at least 1".to_string(),
            });
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(MtlError::InvalidInput {
                reason: format!("tolerance must be positive and finite, got {}", self.tolerance),
            });
        }
        if !(self.weight_floor >= 0.0 && self.weight_floor.is_finite()) {
            return Err(MtlError::InvalidInput {
                reason: format!("weight_floor must be non-negative and finite, got {}", self.weight_floor),
            });
        }
        Ok(())
    }
}
