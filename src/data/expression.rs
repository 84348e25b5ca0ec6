//! Labelled expression matrix for one task (condition / dataset)

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{MtlError, Result};

/// A labelled samples x columns matrix of expression values.
///
/// Rows are samples; columns are genes (response matrices) or regulators
/// (design matrices). Column ids are unique so that "same id" means "same
/// regulator" across tasks.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Values (samples x columns)
    values: Array2<f64>,
    /// Sample identifiers (rows)
    sample_ids: Vec<String>,
    /// Column identifiers (genes or regulators)
    column_ids: Vec<String>,
    /// Column id -> column position
    index: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Create a new expression matrix from raw data
    pub fn new(values: Array2<f64>, sample_ids: Vec<String>, column_ids: Vec<String>) -> Result<Self> {
        let (n_samples, n_columns) = values.dim();

        if sample_ids.len() != n_samples {
            return Err(MtlError::shape(
                format!("{} sample IDs", n_samples),
                format!("{} sample IDs", sample_ids.len()),
            ));
        }

        if column_ids.len() != n_columns {
            return Err(MtlError::shape(
                format!("{} column IDs", n_columns),
                format!("{} column IDs", column_ids.len()),
            ));
        }

        if values.iter().any(|x| !x.is_finite()) {
            return Err(MtlError::InvalidInput {
                reason: "Expression values must be finite".to_string(),
            });
        }

        let mut index = HashMap::with_capacity(n_columns);
        for (j, id) in column_ids.iter().enumerate() {
            if index.insert(id.clone(), j).is_some() {
                return Err(MtlError::InvalidInput {
                    reason: format!("Duplicate column ID '{}'", id),
                });
            }
        }

        Ok(Self {
            values,
            sample_ids,
            column_ids,
            index,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.values.ncols()
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn column_ids(&self) -> &[String] {
        &self.column_ids
    }

    /// Whether a column with this id exists
    pub fn contains(&self, column_id: &str) -> bool {
        self.index.contains_key(column_id)
    }

    /// Get column index by ID
    pub fn column_index(&self, column_id: &str) -> Option<usize> {
        self.index.get(column_id).copied()
    }

    /// Get a single column by ID
    pub fn column(&self, column_id: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(column_id).map(|j| self.values.column(j))
    }

    /// Extract the columns named in `column_ids`, in that order.
    ///
    /// Fails with `InvalidInput` naming the first id that is not present.
    pub fn select_columns(&self, column_ids: &[String]) -> Result<Array2<f64>> {
        let positions = column_ids
            .iter()
            .map(|id| {
                self.column_index(id).ok_or_else(|| MtlError::InvalidInput {
                    reason: format!("Column '{}' not found in expression matrix", id),
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        Ok(self.values.select(Axis(1), &positions))
    }
}
