use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Half squared error for regression outputs.
pub struct SquaredError;

impl SquaredError {
    /// Per-example loss: `0.5 · Σ_j (predicted − expected)²`.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<Vec<f64>> {
        check_shapes(predicted, expected)?;
        Ok(predicted
            .data
            .iter()
            .zip(expected.data.iter())
            .map(|(p, y)| 0.5 * p.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>())
            .collect())
    }

    /// Gradient of the mean loss: `(predicted − expected) / batch`.
    pub fn grad(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        let per_example = Self::per_example_grad(predicted, expected)?;
        Ok(per_example.scale(1.0 / predicted.rows.max(1) as f64))
    }

    /// `predicted − expected`, one row per example.
    pub fn per_example_grad(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_shapes(predicted, expected)?;
        predicted.zip_map(expected, |a, b| a - b)
    }
}

fn check_shapes(predicted: &Matrix, expected: &Matrix) -> Result<()> {
    if predicted.shape() != expected.shape() {
        return Err(NnError::ShapeMismatch {
            op: "squared-error targets",
            expected: predicted.shape(),
            found: expected.shape(),
        });
    }
    Ok(())
}
