//! Penalty selection: EBIC scoring and the warm-started (lamB, lamS) grid search

mod ebic;
mod grid;

pub use ebic::{ebic, residual_sum_of_squares, task_ebic};
pub use grid::{lam_b_baseline, GridScore, ModelSelector, Selection};

use crate::error::{MtlError, Result};
use crate::stats::{linspace, logspace};

/// Range of the outer-grid multipliers applied to the lamB baseline
pub const LAM_B_SCALE_RANGE: (f64, f64) = (0.01, 10.0);
/// Number of log-spaced lamB multipliers
pub const N_LAM_B_SCALES: usize = 20;
/// Range of the inner-grid multipliers applied to the current lamB to get lamS
pub const LAM_S_SCALE_RANGE: (f64, f64) = (0.51, 0.99);
/// Number of linearly spaced lamS multipliers
pub const N_LAM_S_SCALES: usize = 10;
/// Default EBIC complexity weight
pub const DEFAULT_GAMMA: f64 = 1.0;

/// Default lamB multipliers in traversal order: from the strongest penalty
/// (10 x baseline) down to the weakest (0.01 x baseline).
pub fn default_lam_b_scales() -> Vec<f64> {
    let mut scales = logspace(LAM_B_SCALE_RANGE.0, LAM_B_SCALE_RANGE.1, N_LAM_B_SCALES);
    scales.reverse();
    scales
}

/// Default lamS multipliers in traversal order: 0.99 down to 0.51.
pub fn default_lam_s_scales() -> Vec<f64> {
    let mut scales = linspace(LAM_S_SCALE_RANGE.0, LAM_S_SCALE_RANGE.1, N_LAM_S_SCALES);
    scales.reverse();
    scales
}

/// Configurable parameters for EBIC model selection.
///
/// The order of the two scale vectors is the grid traversal order.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    /// Outer grid: multipliers of the data-driven lamB baseline
    pub lam_b_scales: Vec<f64>,
    /// Inner grid: multipliers of the current lamB giving lamS
    pub lam_s_scales: Vec<f64>,
    /// Weight of the combinatorial EBIC term
    pub gamma: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            lam_b_scales: default_lam_b_scales(),
            lam_s_scales: default_lam_s_scales(),
            gamma: DEFAULT_GAMMA,
        }
    }
}

impl SelectionParams {
    /// Total number of grid points
    pub fn n_points(&self) -> usize {
        self.lam_b_scales.len() * self.lam_s_scales.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.lam_b_scales.is_empty() || self.lam_s_scales.is_empty() {
            return Err(MtlError::InvalidInput {
                reason: "penalty grids must not be empty".to_string(),
            });
        }
        if let Some(bad) = self
            .lam_b_scales
            .iter()
            .chain(self.lam_s_scales.iter())
            .find(|s| !(s.is_finite() && **s >= 0.0))
        {
            return Err(MtlError::InvalidInput {
                reason: format!("penalty scales must be finite and non-negative, got {}", bad),
            });
        }
        if !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return Err(MtlError::InvalidInput {
                reason: format!("gamma must be finite and non-negative, got {}", self.gamma),
            });
        }
        Ok(())
    }
}
