use crate::error::Result;
use crate::loss::cross_entropy::SoftmaxCrossEntropy;
use crate::loss::squared_error::SquaredError;
use crate::math::matrix::Matrix;

/// What the network output is compared against, which also selects the loss.
///
/// - `Labels`: integer class indices; softmax cross-entropy on logits.
/// - `Values`: real-valued targets of the output's shape; half squared error.
#[derive(Debug, Clone, Copy)]
pub enum Targets<'a> {
    Labels(&'a [usize]),
    Values(&'a Matrix),
}

impl<'a> Targets<'a> {
    pub fn len(&self) -> usize {
        match self {
            Targets::Labels(labels) => labels.len(),
            Targets::Values(values) => values.rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn per_example_loss(&self, output: &Matrix) -> Result<Vec<f64>> {
        match self {
            Targets::Labels(labels) => SoftmaxCrossEntropy::loss(output, labels),
            Targets::Values(values) => SquaredError::loss(output, values),
        }
    }

    /// Gradient of the loss w.r.t. `output`, one row per example and not
    /// averaged. Dense layers average over the batch themselves.
    pub fn output_gradient(&self, output: &Matrix) -> Result<Matrix> {
        match self {
            Targets::Labels(labels) => SoftmaxCrossEntropy::per_example_grad(output, labels),
            Targets::Values(values) => SquaredError::per_example_grad(output, values),
        }
    }
}
