//! Variance-explained rescaling of the regulators that survive model selection
//!
//! Each surviving regulator is scored by how much residual variance the
//! ordinary least squares refit loses when that regulator is dropped:
//! `1 - var(full residuals) / var(residuals without j)`. With a single survivor
//! the reduced model is the raw response, so the score is `1 - var(full) / var(y)`.

use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{MtlError, Result};
use crate::stats::{ordinary_least_squares, population_variance};

/// One row of a per-task result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorWeight {
    pub regulator: String,
    pub target: String,
    /// OLS coefficient of the regulator in the refit on the surviving set
    #[serde(rename = "weights")]
    pub weight: f64,
    /// Fraction of residual variance lost when the regulator is dropped
    #[serde(rename = "resc_weights")]
    pub rescaled_weight: f64,
}

/// `1 - full / reduced`, with a zero-variance reduced model scoring 0
fn variance_explained(full: f64, reduced: f64) -> f64 {
    if reduced > 0.0 {
        1.0 - full / reduced
    } else {
        0.0
    }
}

/// Refit OLS on the surviving regulators of one task and score each of them.
///
/// `design` holds only the surviving columns, in the order of `regulators`.
pub fn final_weights(
    design: ArrayView2<f64>,
    response: ArrayView1<f64>,
    regulators: &[String],
    target: &str,
) -> Result<Vec<RegulatorWeight>> {
    let n_preds = regulators.len();
    if design.ncols() != n_preds {
        return Err(MtlError::shape(
            format!("{} design columns (one per surviving regulator)", n_preds),
            format!("{}", design.ncols()),
        ));
    }
    if design.nrows() != response.len() {
        return Err(MtlError::shape(
            format!("{} response values (design rows)", design.nrows()),
            format!("{}", response.len()),
        ));
    }
    if n_preds == 0 {
        return Ok(Vec::new());
    }

    let full = ordinary_least_squares(design, response);
    let var_full = population_variance(&full.residuals.to_vec());

    let rescaled: Vec<f64> = if n_preds == 1 {
        vec![variance_explained(var_full, population_variance(&response.to_vec()))]
    } else {
        (0..n_preds)
            .map(|j| {
                let keep: Vec<usize> = (0..n_preds).filter(|&i| i != j).collect();
                let reduced_design = design.select(Axis(1), &keep);
                let reduced = ordinary_least_squares(reduced_design.view(), response);
                variance_explained(var_full, population_variance(&reduced.residuals.to_vec()))
            })
            .collect()
    };

    Ok(regulators
        .iter()
        .zip(full.coefficients.iter())
        .zip(rescaled)
        .map(|((regulator, &weight), rescaled_weight)| RegulatorWeight {
            regulator: regulator.clone(),
            target: target.to_string(),
            weight,
            rescaled_weight,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_regulator_uses_response_variance() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.2, 1.9, 3.2, 3.8, 5.1];
        let rows = final_weights(x.view(), y.view(), &ids(&["tf1"]), "g").unwrap();
        assert_eq!(rows.len(), 1);

        // Closed-form simple regression
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x_mean = 3.0;
        let y_mean = y.mean().unwrap();
        let sxy: f64 = xs.iter().zip(y.iter()).map(|(a, b)| (a - x_mean) * (b - y_mean)).sum();
        let slope = sxy / 10.0;
        let residuals: Vec<f64> = xs
            .iter()
            .zip(y.iter())
            .map(|(a, b)| b - (y_mean + slope * (a - x_mean)))
            .collect();
        let vf = population_variance(&residuals);
        let v = population_variance(&y.to_vec());

        assert!((rows[0].weight - slope).abs() < 1e-10);
        assert!((rows[0].rescaled_weight - (1.0 - vf / v)).abs() < 1e-10);
        assert_eq!(rows[0].regulator, "tf1");
        assert_eq!(rows[0].target, "g");
    }

    #[test]
    fn test_dominant_regulator_scores_higher() {
        let x = array![
            [1.0, 0.3],
            [2.0, -0.1],
            [3.0, 0.4],
            [4.0, -0.2],
            [5.0, 0.1],
            [6.0, -0.3]
        ];
        let y = array![2.1, 4.0, 6.3, 7.9, 10.2, 11.8];
        let rows = final_weights(x.view(), y.view(), &ids(&["strong", "weak"]), "g").unwrap();
        assert!(rows[0].rescaled_weight > 0.9, "strong: {}", rows[0].rescaled_weight);
        assert!(rows[1].rescaled_weight < rows[0].rescaled_weight);
        assert!(rows[1].rescaled_weight >= 0.0);
        assert!((rows[0].weight - 2.0).abs() < 0.2);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0, 2.0];
        let result = final_weights(x.view(), y.view(), &ids(&["tf1"]), "g");
        assert!(matches!(result, Err(MtlError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_no_survivors_gives_empty_table() {
        let x = ndarray::Array2::<f64>::zeros((3, 0));
        let y = array![1.0, 2.0, 3.0];
        assert!(final_weights(x.view(), y.view(), &[], "g").unwrap().is_empty());
    }

    #[test]
    fn test_records_serialize_with_table_columns() {
        let row = RegulatorWeight {
            regulator: "tf1".to_string(),
            target: "g".to_string(),
            weight: 0.5,
            rescaled_weight: 0.25,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"weights\":0.5"));
        assert!(json.contains("\"resc_weights\":0.25"));
    }
}
