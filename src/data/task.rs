//! Per-task data for a single target gene, and the full per-task datasets it is cut from

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::ExpressionMatrix;
use crate::error::{MtlError, Result};

/// Design matrix and response vector of one task for the gene being fit.
///
/// Design columns are candidate regulators, in the same order for every task
/// of a gene fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskData")]
pub struct TaskData {
    /// Design matrix (samples x regulators)
    design: Array2<f64>,
    /// Response vector (samples)
    response: Array1<f64>,
}

impl TaskData {
    pub fn new(design: Array2<f64>, response: Array1<f64>) -> Result<Self> {
        if design.nrows() != response.len() {
            return Err(MtlError::shape(
                format!("{} response values (design rows)", design.nrows()),
                format!("{} response values", response.len()),
            ));
        }
        Ok(Self { design, response })
    }

    pub fn n_samples(&self) -> usize {
        self.design.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.design.ncols()
    }

    pub fn design(&self) -> ArrayView2<'_, f64> {
        self.design.view()
    }

    pub fn response(&self) -> ArrayView1<'_, f64> {
        self.response.view()
    }

    pub(crate) fn design_mut(&mut self) -> &mut Array2<f64> {
        &mut self.design
    }

    pub(crate) fn response_mut(&mut self) -> &mut Array1<f64> {
        &mut self.response
    }
}

/// Unchecked wire form of `TaskData`; deserialization goes through `TaskData::new`
#[derive(Deserialize)]
struct RawTaskData {
    design: Array2<f64>,
    response: Array1<f64>,
}

impl TryFrom<RawTaskData> for TaskData {
    type Error = MtlError;

    fn try_from(raw: RawTaskData) -> Result<Self> {
        TaskData::new(raw.design, raw.response)
    }
}

/// One task's slice of a gene fit, tagged with its global task index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    /// Index of the task in the caller's list of datasets
    pub task_index: usize,
    pub data: TaskData,
}

/// Everything needed to fit one target gene: the unit of work handed to an executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneFitInput {
    /// Target gene identifier
    pub gene_id: String,
    /// Candidate regulator ids, in design-column order
    pub regulators: Vec<String>,
    /// Tasks in which the gene has data
    pub tasks: Vec<TaskInput>,
}

impl GeneFitInput {
    pub fn new(gene_id: impl Into<String>, regulators: Vec<String>, tasks: Vec<TaskInput>) -> Self {
        Self {
            gene_id: gene_id.into(),
            regulators,
            tasks,
        }
    }

    pub fn n_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Check the preconditions of a gene fit without computing anything.
    ///
    /// At least two tasks are required, every task must have samples, and every
    /// design matrix must have exactly one column per regulator id.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.len() < 2 {
            return Err(MtlError::InsufficientData {
                gene_id: self.gene_id.clone(),
                reason: format!("{} task(s) with data, at least 2 are required", self.tasks.len()),
            });
        }

        if self.regulators.is_empty() {
            return Err(MtlError::InsufficientData {
                gene_id: self.gene_id.clone(),
                reason: "no candidate regulators".to_string(),
            });
        }

        for task in &self.tasks {
            if task.data.n_features() != self.regulators.len() {
                return Err(MtlError::shape(
                    format!("{} design columns (one per regulator) in task {}", self.regulators.len(), task.task_index),
                    format!("{} design columns", task.data.n_features()),
                ));
            }
            if task.data.n_samples() == 0 {
                return Err(MtlError::InsufficientData {
                    gene_id: self.gene_id.clone(),
                    reason: format!("task {} has no samples", task.task_index),
                });
            }
        }

        Ok(())
    }
}

/// The full data of one task: regulator design matrix and gene response matrix
/// over the same samples.
#[derive(Debug, Clone)]
pub struct TaskDataset {
    design: ExpressionMatrix,
    response: ExpressionMatrix,
}

impl TaskDataset {
    pub fn new(design: ExpressionMatrix, response: ExpressionMatrix) -> Result<Self> {
        if design.n_samples() != response.n_samples() {
            return Err(MtlError::shape(
                format!("{} response samples (design samples)", design.n_samples()),
                format!("{} response samples", response.n_samples()),
            ));
        }
        if design.sample_ids() != response.sample_ids() {
            return Err(MtlError::InvalidInput {
                reason: "design and response matrices must list the same samples in the same order".to_string(),
            });
        }
        Ok(Self { design, response })
    }

    pub fn design(&self) -> &ExpressionMatrix {
        &self.design
    }

    pub fn response(&self) -> &ExpressionMatrix {
        &self.response
    }

    /// Whether the response matrix has a column for this gene
    pub fn has_gene(&self, gene_id: &str) -> bool {
        self.response.contains(gene_id)
    }

    /// Slice out the design (restricted to `regulators`) and response for one gene
    pub fn task_data(&self, gene_id: &str, regulators: &[String]) -> Result<TaskData> {
        let response = self
            .response
            .column(gene_id)
            .ok_or_else(|| MtlError::InvalidInput {
                reason: format!("Gene '{}' not found in response matrix", gene_id),
            })?
            .to_owned();
        let design = self.design.select_columns(regulators)?;
        TaskData::new(design, response)
    }
}
