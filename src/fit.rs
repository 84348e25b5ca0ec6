//! Per-gene fitting: the unit of work an executor runs for each target gene
//!
//! Standardize each task, build covariance terms, select penalties by EBIC over
//! the warm-started grid, then rescale the surviving regulators of every task.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::{GeneFitInput, TaskData};
use crate::error::Result;
use crate::preprocess::{covariance_terms, standardize_tasks};
use crate::rescale::{final_weights, RegulatorWeight};
use crate::selection::{ModelSelector, SelectionParams};
use crate::solver::SolverParams;

/// Parameters of a complete gene fit
#[derive(Debug, Clone, Default)]
pub struct FitParams {
    pub solver: SolverParams,
    pub selection: SelectionParams,
}

impl FitParams {
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()?;
        self.selection.validate()
    }
}

/// Result record of one target gene. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneFitResult {
    pub gene_id: String,
    /// Global task index -> surviving regulators of that task.
    /// Tasks where no regulator survived are absent.
    pub tasks: BTreeMap<usize, Vec<RegulatorWeight>>,
    /// Selected block-sparse penalty
    pub lam_b: f64,
    /// Selected sparse penalty
    pub lam_s: f64,
    /// EBIC of the selected model
    pub ebic: f64,
}

impl GeneFitResult {
    /// Result table of one task, if any regulator survived there
    pub fn task(&self, task_index: usize) -> Option<&[RegulatorWeight]> {
        self.tasks.get(&task_index).map(|rows| rows.as_slice())
    }
}

/// Fit one target gene across its tasks.
///
/// Fails fast, before any computation, with `InsufficientData` when fewer than
/// two tasks are given and with `ShapeMismatch` when a design matrix does not
/// have one column per regulator.
pub fn fit_gene(input: &GeneFitInput, params: &FitParams) -> Result<GeneFitResult> {
    input.validate()?;
    let selector = ModelSelector::new(params.solver.clone(), params.selection.clone())?;

    debug!(
        "Fitting gene {} across {} tasks with {} candidate regulators",
        input.gene_id,
        input.n_tasks(),
        input.regulators.len()
    );

    let raw: Vec<TaskData> = input.tasks.iter().map(|t| t.data.clone()).collect();
    let tasks = standardize_tasks(&raw);
    let terms = covariance_terms(&tasks);
    let selection = selector.select_with_terms(&tasks, &terms)?;

    debug!(
        "Gene {}: selected lamB={:.5} lamS={:.5} (EBIC {:.4}, grid point {} of {})",
        input.gene_id,
        selection.lam_b,
        selection.lam_s,
        selection.ebic,
        selection.grid_index + 1,
        selection.path.len()
    );

    let mut results = BTreeMap::new();
    for (k, (task_input, task)) in input.tasks.iter().zip(tasks.iter()).enumerate() {
        let surviving: Vec<usize> = selection
            .weights
            .column(k)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w != 0.0)
            .map(|(j, _)| j)
            .collect();
        if surviving.is_empty() {
            continue;
        }

        let regulators: Vec<String> = surviving.iter().map(|&j| input.regulators[j].clone()).collect();
        let design = task.design().select(ndarray::Axis(1), &surviving);
        let rows = final_weights(design.view(), task.response(), &regulators, &input.gene_id)?;
        results.insert(task_input.task_index, rows);
    }

    Ok(GeneFitResult {
        gene_id: input.gene_id.clone(),
        tasks: results,
        lam_b: selection.lam_b,
        lam_s: selection.lam_s,
        ebic: selection.ebic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TaskInput;
    use crate::error::MtlError;
    use ndarray::{array, Array2};

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn design() -> Array2<f64> {
        array![
            [-2.0, 1.0, 1.0],
            [-1.0, -2.0, 0.0],
            [0.0, 0.0, -2.0],
            [1.0, 2.0, 0.0],
            [2.0, -1.0, 1.0]
        ]
    }

    fn task(index: usize, response_column: usize) -> TaskInput {
        let x = design();
        let y = x.column(response_column).mapv(|v| 3.0 * v + 1.0);
        TaskInput {
            task_index: index,
            data: TaskData::new(x, y).unwrap(),
        }
    }

    #[test]
    fn test_noiseless_shared_regulator() {
        let input = GeneFitInput::new("target", ids(&["tf1", "tf2", "tf3"]), vec![task(0, 0), task(3, 0)]);
        let result = fit_gene(&input, &FitParams::default()).unwrap();

        assert_eq!(result.gene_id, "target");
        // keyed by global task index
        let keys: Vec<usize> = result.tasks.keys().copied().collect();
        assert_eq!(keys, vec![0, 3]);
        for rows in result.tasks.values() {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].regulator, "tf1");
            assert_eq!(rows[0].target, "target");
            // standardized response equals standardized tf1
            assert!((rows[0].weight - 1.0).abs() < 1e-8, "weight {}", rows[0].weight);
            assert!((rows[0].rescaled_weight - 1.0).abs() < 1e-8);
        }
    }

    #[test]
    fn test_task_specific_regulators() {
        let input = GeneFitInput::new("target", ids(&["tf1", "tf2", "tf3"]), vec![task(0, 0), task(1, 1)]);
        let result = fit_gene(&input, &FitParams::default()).unwrap();
        let first: Vec<&str> = result.task(0).unwrap().iter().map(|r| r.regulator.as_str()).collect();
        let second: Vec<&str> = result.task(1).unwrap().iter().map(|r| r.regulator.as_str()).collect();
        assert!(first.contains(&"tf1"));
        assert!(second.contains(&"tf2"));
        assert!(!first.contains(&"tf3") && !second.contains(&"tf3"));
    }

    #[test]
    fn test_shape_mismatch_before_computation() {
        // 3 design columns but only 2 regulator ids
        let input = GeneFitInput::new("target", ids(&["tf1", "tf2"]), vec![task(0, 0), task(1, 0)]);
        let result = fit_gene(&input, &FitParams::default());
        assert!(matches!(result, Err(MtlError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_single_task_is_insufficient() {
        let input = GeneFitInput::new("target", ids(&["tf1", "tf2", "tf3"]), vec![task(0, 0)]);
        let result = fit_gene(&input, &FitParams::default());
        assert!(matches!(result, Err(MtlError::InsufficientData { .. })));
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let input = GeneFitInput::new("target", ids(&["tf1", "tf2", "tf3"]), vec![task(0, 0), task(1, 0)]);
        let result = fit_gene(&input, &FitParams::default()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: GeneFitResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gene_id, result.gene_id);
        assert_eq!(back.tasks.len(), result.tasks.len());
    }
}
