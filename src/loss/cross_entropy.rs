use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Softmax cross-entropy computed directly from logits.
pub struct SoftmaxCrossEntropy;

impl SoftmaxCrossEntropy {
    /// Per-example loss: `logsumexp(row) - row[label]`.
    ///
    /// The row maximum is subtracted before exponentiating, so at least one
    /// term of every sum is exactly 1 and nothing overflows. The caller
    /// reduces with a mean.
    pub fn loss(logits: &Matrix, labels: &[usize]) -> Result<Vec<f64>> {
        check_labels(logits, labels)?;
        Ok(logits
            .data
            .iter()
            .zip(labels.iter())
            .map(|(row, &label)| {
                let max = row_max(row);
                let sum: f64 = row.iter().map(|&z| (z - max).exp()).sum();
                max + sum.ln() - row[label]
            })
            .collect())
    }

    /// Row-wise softmax.
    pub fn softmax(logits: &Matrix) -> Matrix {
        let data = logits
            .data
            .iter()
            .map(|row| {
                let max = row_max(row);
                let exps: Vec<f64> = row.iter().map(|&z| (z - max).exp()).collect();
                let sum: f64 = exps.iter().sum();
                exps.into_iter().map(|e| e / sum).collect()
            })
            .collect();
        Matrix { rows: logits.rows, cols: logits.cols, data }
    }

    /// Gradient of the *mean* loss w.r.t. the logits:
    ///   (softmax(logits) − onehot(labels)) / batch
    ///
    /// Already averaged; do not divide by the batch size again.
    pub fn grad(logits: &Matrix, labels: &[usize]) -> Result<Matrix> {
        let per_example = Self::per_example_grad(logits, labels)?;
        Ok(per_example.scale(1.0 / logits.rows.max(1) as f64))
    }

    /// `softmax(logits) − onehot(labels)`, one row per example, not averaged.
    pub fn per_example_grad(logits: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_labels(logits, labels)?;
        let mut probs = Self::softmax(logits);
        for (row, &label) in probs.data.iter_mut().zip(labels.iter()) {
            row[label] -= 1.0;
        }
        Ok(probs)
    }
}

fn row_max(row: &[f64]) -> f64 {
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn check_labels(logits: &Matrix, labels: &[usize]) -> Result<()> {
    if labels.len() != logits.rows {
        return Err(NnError::ShapeMismatch {
            op: "cross-entropy labels",
            expected: (logits.rows, 1),
            found: (labels.len(), 1),
        });
    }
    if let Some((row, &label)) = labels.iter().enumerate().find(|&(_, &l)| l >= logits.cols) {
        return Err(NnError::InvalidLabel { row, label, num_classes: logits.cols });
    }
    Ok(())
}
