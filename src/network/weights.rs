//! Pivoting per-gene result tables into target x regulator weight matrices

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{MtlError, Result};
use crate::fit::GeneFitResult;

/// One task's weights: rows are target genes, columns are regulators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeightMatrix")]
pub struct WeightMatrix {
    pub targets: Vec<String>,
    pub regulators: Vec<String>,
    pub values: Array2<f64>,
}

#[derive(Deserialize)]
struct RawWeightMatrix {
    targets: Vec<String>,
    regulators: Vec<String>,
    values: Array2<f64>,
}

impl TryFrom<RawWeightMatrix> for WeightMatrix {
    type Error = MtlError;

    fn try_from(raw: RawWeightMatrix) -> Result<Self> {
        WeightMatrix::new(raw.targets, raw.regulators, raw.values)
    }
}

impl WeightMatrix {
    /// `values` must be targets x regulators
    pub fn new(targets: Vec<String>, regulators: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (targets.len(), regulators.len()) {
            return Err(MtlError::shape(
                format!("weights of shape ({}, {})", targets.len(), regulators.len()),
                format!("{:?}", values.dim()),
            ));
        }
        Ok(Self {
            targets,
            regulators,
            values,
        })
    }

    /// All-zero matrix over the given universe
    pub fn zeros(targets: &[String], regulators: &[String]) -> Self {
        Self {
            targets: targets.to_vec(),
            regulators: regulators.to_vec(),
            values: Array2::zeros((targets.len(), regulators.len())),
        }
    }

    /// Weight of `regulator -> target`, or `None` if either id is outside the universe
    pub fn get(&self, target: &str, regulator: &str) -> Option<f64> {
        let i = self.targets.iter().position(|t| t == target)?;
        let j = self.regulators.iter().position(|r| r == regulator)?;
        Some(self.values[[i, j]])
    }

    /// Number of nonzero edges
    pub fn n_edges(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }
}

/// Raw and rescaled weight matrices, one of each per task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub weights: Vec<WeightMatrix>,
    pub rescaled_weights: Vec<WeightMatrix>,
}

impl NetworkWeights {
    pub fn n_tasks(&self) -> usize {
        self.weights.len()
    }
}

/// Pivot long-format gene results into per-task matrices.
///
/// Pairs with no result are zero. Results for targets, regulators or task
/// indices outside the requested universe are ignored. Negative rescaled
/// weights are clamped to zero.
pub fn pivot_results(
    results: &[GeneFitResult],
    n_tasks: usize,
    targets: &[String],
    regulators: &[String],
) -> NetworkWeights {
    let target_index: HashMap<&str, usize> = targets.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();
    let regulator_index: HashMap<&str, usize> =
        regulators.iter().enumerate().map(|(j, r)| (r.as_str(), j)).collect();

    let mut weights: Vec<WeightMatrix> = (0..n_tasks).map(|_| WeightMatrix::zeros(targets, regulators)).collect();
    let mut rescaled = weights.clone();

    for result in results {
        let Some(&i) = target_index.get(result.gene_id.as_str()) else {
            continue;
        };
        for (&task, rows) in &result.tasks {
            if task >= n_tasks {
                continue;
            }
            for row in rows {
                if let Some(&j) = regulator_index.get(row.regulator.as_str()) {
                    weights[task].values[[i, j]] = row.weight;
                    rescaled[task].values[[i, j]] = row.rescaled_weight.max(0.0);
                }
            }
        }
    }

    NetworkWeights {
        weights,
        rescaled_weights: rescaled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rescale::RegulatorWeight;
    use ndarray::array;
    use std::collections::BTreeMap;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(regulator: &str, target: &str, weight: f64, rescaled_weight: f64) -> RegulatorWeight {
        RegulatorWeight {
            regulator: regulator.to_string(),
            target: target.to_string(),
            weight,
            rescaled_weight,
        }
    }

    fn result(gene: &str, tasks: Vec<(usize, Vec<RegulatorWeight>)>) -> GeneFitResult {
        GeneFitResult {
            gene_id: gene.to_string(),
            tasks: tasks.into_iter().collect::<BTreeMap<_, _>>(),
            lam_b: 1.0,
            lam_s: 0.5,
            ebic: 0.0,
        }
    }

    #[test]
    fn test_pivot_fills_missing_pairs_with_zero() {
        let results = vec![
            result("g1", vec![(0, vec![row("tfA", "g1", 0.8, 0.6)]), (1, vec![row("tfB", "g1", -0.3, 0.2)])]),
            result("g2", vec![(1, vec![row("tfA", "g2", 1.5, 0.9)])]),
        ];
        let net = pivot_results(&results, 2, &ids(&["g1", "g2", "g3"]), &ids(&["tfA", "tfB"]));

        assert_eq!(net.n_tasks(), 2);
        assert_eq!(net.weights[0].values.dim(), (3, 2));
        assert_eq!(net.weights[0].get("g1", "tfA"), Some(0.8));
        assert_eq!(net.weights[0].get("g1", "tfB"), Some(0.0));
        assert_eq!(net.weights[1].get("g1", "tfB"), Some(-0.3));
        assert_eq!(net.weights[1].get("g2", "tfA"), Some(1.5));
        assert_eq!(net.rescaled_weights[1].get("g2", "tfA"), Some(0.9));
        // g3 was never fit
        assert!(net.weights.iter().all(|m| m.values.row(2).iter().all(|&v| v == 0.0)));
        assert_eq!(net.weights[0].n_edges(), 1);
    }

    #[test]
    fn test_pivot_restricts_to_requested_universe() {
        let results = vec![
            result("g1", vec![(0, vec![row("tfA", "g1", 0.8, 0.6), row("tfZ", "g1", 2.0, 0.5)])]),
            result("other", vec![(0, vec![row("tfA", "other", 1.0, 1.0)])]),
        ];
        let net = pivot_results(&results, 1, &ids(&["g1"]), &ids(&["tfA"]));
        assert_eq!(net.weights[0].values.dim(), (1, 1));
        assert_eq!(net.weights[0].get("g1", "tfA"), Some(0.8));
        assert_eq!(net.weights[0].get("g1", "tfZ"), None);
    }

    #[test]
    fn test_deserialized_matrix_is_shape_checked() {
        let matrix = WeightMatrix::new(ids(&["g1"]), ids(&["tfA", "tfB"]), array![[0.5, 0.0]]).unwrap();
        let mut json = serde_json::to_value(&matrix).unwrap();
        let back: WeightMatrix = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, matrix);

        json["regulators"] = serde_json::to_value(ids(&["tfA"])).unwrap();
        assert!(serde_json::from_value::<WeightMatrix>(json).is_err());
    }

    #[test]
    fn test_negative_rescaled_weights_clamped() {
        let results = vec![result("g1", vec![(0, vec![row("tfA", "g1", -0.4, -0.05)])])];
        let net = pivot_results(&results, 1, &ids(&["g1"]), &ids(&["tfA"]));
        assert_eq!(net.weights[0].get("g1", "tfA"), Some(-0.4));
        assert_eq!(net.rescaled_weights[0].get("g1", "tfA"), Some(0.0));
    }
}
