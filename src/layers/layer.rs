use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::dense::{Dense, DenseGradients};
use crate::math::matrix::Matrix;
use crate::train::train_config::TrainConfig;

/// A building block of the network.
///
/// `forward` maps `[batch, in]` to `[batch, out]` and must not change any
/// parameters. `backward` receives the layer's own forward input and the
/// gradient of the loss w.r.t. its output, may update its parameters, and
/// returns the gradient w.r.t. its input so the caller can continue the chain.
pub trait Layer {
    fn forward(&self, input: &Matrix) -> Result<Matrix>;

    fn backward(&mut self, input: &Matrix, grad_output: &Matrix, config: &TrainConfig) -> Result<Matrix>;
}

/// The closed set of layers a `Network` is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkLayer {
    Dense(Dense),
    Activation(ActivationFunction),
}

impl NetworkLayer {
    /// Backward pass without updating anything. Returns the input gradient
    /// and, for Dense layers, the parameter gradients.
    pub fn propagate(
        &self,
        input: &Matrix,
        grad_output: &Matrix,
        l2: f64,
    ) -> Result<(Matrix, Option<DenseGradients>)> {
        match self {
            NetworkLayer::Dense(dense) => {
                let (grad_input, grads) = dense.compute_gradients(input, grad_output, l2)?;
                Ok((grad_input, Some(grads)))
            }
            NetworkLayer::Activation(function) => {
                let mut function = *function;
                let grad_input = function.backward(input, grad_output, &TrainConfig::default())?;
                Ok((grad_input, None))
            }
        }
    }

    pub fn as_dense(&self) -> Option<&Dense> {
        match self {
            NetworkLayer::Dense(dense) => Some(dense),
            NetworkLayer::Activation(_) => None,
        }
    }

    pub fn as_dense_mut(&mut self) -> Option<&mut Dense> {
        match self {
            NetworkLayer::Dense(dense) => Some(dense),
            NetworkLayer::Activation(_) => None,
        }
    }
}

impl Layer for NetworkLayer {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        match self {
            NetworkLayer::Dense(dense) => dense.forward(input),
            NetworkLayer::Activation(function) => function.forward(input),
        }
    }

    fn backward(&mut self, input: &Matrix, grad_output: &Matrix, config: &TrainConfig) -> Result<Matrix> {
        match self {
            NetworkLayer::Dense(dense) => dense.backward(input, grad_output, config),
            NetworkLayer::Activation(function) => function.backward(input, grad_output, config),
        }
    }
}
