//! RustMtlGrn: multi-task Dirty Model regression for gene regulatory networks
//!
//! Each target gene is regressed on its candidate regulators jointly across
//! several tasks (conditions or datasets). The coefficient matrix is split into
//! a block-sparse part shared across tasks and a sparse task-specific part,
//! the two penalties are chosen by EBIC over a warm-started grid, and the
//! surviving regulators are rescaled by the variance they explain.
//!
//! # Example
//!
//! ```ignore
//! use rust_mtl_grn::prelude::*;
//!
//! // One dataset per task: regulator design and gene response over the same samples
//! let datasets = vec![TaskDataset::new(design_a, response_a)?, TaskDataset::new(design_b, response_b)?];
//!
//! // Fit every target across tasks in parallel
//! let model = MultiTaskRegression::new(FitParams::default())?;
//! let network = model.run(&datasets, &targets, &regulators, &RayonExecutor::default())?;
//!
//! // One target x regulator matrix per task
//! let first_task = &network.rescaled_weights[0];
//! ```

pub mod data;
pub mod error;
pub mod fit;
pub mod network;
pub mod preprocess;
pub mod rescale;
pub mod selection;
pub mod solver;
pub mod stats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{ExpressionMatrix, GeneFitInput, TaskData, TaskDataset, TaskInput};
    pub use crate::error::{MtlError, Result};
    pub use crate::fit::{fit_gene, FitParams, GeneFitResult};
    pub use crate::network::{
        assemble_gene_inputs, GeneExecutor, MultiTaskRegression, NetworkWeights, RayonExecutor, SequentialExecutor,
        WeightMatrix,
    };
    pub use crate::preprocess::{covariance_terms, standardize_tasks, CovarianceTerms};
    pub use crate::rescale::{final_weights, RegulatorWeight};
    pub use crate::selection::{ebic, GridScore, ModelSelector, Selection, SelectionParams};
    pub use crate::solver::{DirtyFit, DirtyModelSolver, SolverParams, SolverState};
}

use prelude::*;

/// Run network inference with default parameters on the global rayon pool
pub fn infer_network(datasets: &[TaskDataset], targets: &[String], regulators: &[String]) -> Result<NetworkWeights> {
    MultiTaskRegression::new(FitParams::default())?.run(datasets, targets, regulators, &RayonExecutor::global())
}
