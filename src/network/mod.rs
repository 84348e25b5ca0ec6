//! Network-level inference: assemble per-gene inputs, dispatch the fits and
//! pivot the results into per-task weight matrices

mod assemble;
mod executor;
mod weights;

pub use assemble::assemble_gene_inputs;
pub use executor::{GeneExecutor, RayonExecutor, SequentialExecutor};
pub use weights::{pivot_results, NetworkWeights, WeightMatrix};

use log::info;

use crate::data::TaskDataset;
use crate::error::Result;
use crate::fit::{FitParams, GeneFitResult};

/// Multi-task network inference over a set of task datasets
#[derive(Debug, Clone, Default)]
pub struct MultiTaskRegression {
    params: FitParams,
}

impl MultiTaskRegression {
    pub fn new(params: FitParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    /// Fit every target gene present in at least two tasks and pivot the results.
    ///
    /// The returned matrices have one row per entry of `targets` and one column
    /// per entry of `regulators`, in the given order, for each dataset. The first
    /// failing gene fit aborts the run.
    pub fn run<E: GeneExecutor + ?Sized>(
        &self,
        datasets: &[TaskDataset],
        targets: &[String],
        regulators: &[String],
        executor: &E,
    ) -> Result<NetworkWeights> {
        info!(
            "Multi-task inference: {} tasks, {} targets, {} regulators",
            datasets.len(),
            targets.len(),
            regulators.len()
        );

        let inputs = assemble_gene_inputs(datasets, targets, regulators)?;
        let results = executor
            .execute(&inputs, &self.params)
            .into_iter()
            .collect::<Result<Vec<GeneFitResult>>>()?;

        info!("Fitted {} genes", results.len());
        Ok(pivot_results(&results, datasets.len(), targets, regulators))
    }
}
