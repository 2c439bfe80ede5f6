use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::layer::Layer;
use crate::math::matrix::Matrix;
use crate::train::train_config::TrainConfig;

/// Stateless element-wise nonlinearity. Used directly as a network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[serde(rename = "relu")]
    ReLU,
    Sigmoid,
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative evaluated at the layer *input* (pre-activation).
    ///
    /// ReLU uses the convention f'(0) = 0.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Tanh => "tanh",
        }
    }
}

impl Layer for ActivationFunction {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        Ok(input.map(|x| self.function(x)))
    }

    fn backward(&mut self, input: &Matrix, grad_output: &Matrix, _config: &TrainConfig) -> Result<Matrix> {
        if input.shape() != grad_output.shape() {
            return Err(NnError::ShapeMismatch {
                op: "activation backward",
                expected: input.shape(),
                found: grad_output.shape(),
            });
        }
        grad_output.zip_map(input, |g, x| g * self.derivative(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_forward_clamps_negatives() {
        let x = Matrix::from_rows(vec![vec![-1.0, 0.0, 2.5]]).unwrap();
        let y = ActivationFunction::ReLU.forward(&x).unwrap();
        assert_eq!(y.data, vec![vec![0.0, 0.0, 2.5]]);
    }

    #[test]
    fn relu_backward_gates_on_input_sign() {
        let x = Matrix::from_rows(vec![vec![-1.0, 0.0, 2.5]]).unwrap();
        let g = Matrix::from_rows(vec![vec![3.0, 4.0, 5.0]]).unwrap();
        let mut relu = ActivationFunction::ReLU;
        let dx = relu.backward(&x, &g, &TrainConfig::default()).unwrap();
        assert_eq!(dx.data, vec![vec![0.0, 0.0, 5.0]]);
        assert!(!dx.data[0][1].is_nan());
    }

    #[test]
    fn sigmoid_derivative_matches_finite_difference() {
        let h = 1e-6;
        for &x in &[-3.0, -0.5, 0.0, 0.7, 4.0] {
            let numeric = (ActivationFunction::Sigmoid.function(x + h)
                - ActivationFunction::Sigmoid.function(x - h))
                / (2.0 * h);
            assert!((numeric - ActivationFunction::Sigmoid.derivative(x)).abs() < 1e-8);
        }
    }

    #[test]
    fn tanh_derivative_at_zero_is_one() {
        assert!((ActivationFunction::Tanh.derivative(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn backward_rejects_mismatched_gradient() {
        let x = Matrix::zeros(2, 3);
        let g = Matrix::zeros(2, 2);
        let mut relu = ActivationFunction::ReLU;
        assert!(relu.backward(&x, &g, &TrainConfig::default()).is_err());
    }
}
