use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::layer::Layer;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::{gradient_descent_step, rmsprop_step, Optimizer};
use crate::train::train_config::TrainConfig;

/// RMSProp squared-gradient averages, one per parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accumulators {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Accumulators {
    fn zeros_for(weights: &Matrix, biases: &Matrix) -> Accumulators {
        Accumulators {
            weights: Matrix::zeros_like(weights),
            biases: Matrix::zeros_like(biases),
        }
    }
}

/// Batch-averaged parameter gradients of one Dense layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

/// Fully connected layer: `output = input · W + b`.
///
/// `weights` is `[input_units, output_units]`, `biases` is `[1, output_units]`.
/// The accumulators stay `None` until the first RMSProp update.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    pub weights: Matrix,
    pub biases: Matrix,
    accumulators: Option<Accumulators>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(input_units: usize, output_units: usize, rng: &mut R) -> Dense {
        Dense {
            weights: Matrix::glorot(input_units, output_units, rng),
            biases: Matrix::zeros(1, output_units),
            accumulators: None,
        }
    }

    /// Rebuilds a layer from stored parameters, checking every shape.
    pub fn from_parameters(
        weights: Matrix,
        biases: Matrix,
        accumulators: Option<Accumulators>,
    ) -> Result<Dense> {
        weights.validate()?;
        biases.validate()?;
        if biases.shape() != (1, weights.cols) {
            return Err(NnError::ShapeMismatch {
                op: "dense biases",
                expected: (1, weights.cols),
                found: biases.shape(),
            });
        }
        if let Some(acc) = &accumulators {
            acc.weights.validate()?;
            acc.biases.validate()?;
            if acc.weights.shape() != weights.shape() || acc.biases.shape() != biases.shape() {
                return Err(NnError::ShapeMismatch {
                    op: "dense accumulators",
                    expected: weights.shape(),
                    found: acc.weights.shape(),
                });
            }
        }
        Ok(Dense { weights, biases, accumulators })
    }

    pub fn input_units(&self) -> usize {
        self.weights.rows
    }

    pub fn output_units(&self) -> usize {
        self.weights.cols
    }

    pub fn accumulators(&self) -> Option<&Accumulators> {
        self.accumulators.as_ref()
    }

    /// Returns `(grad_input, parameter gradients)` without touching the layer.
    ///
    /// `grad_output` holds one gradient row per example; the parameter
    /// gradients are averaged over the batch. `l2` adds `l2 · W` to the
    /// weight gradient.
    pub fn compute_gradients(
        &self,
        input: &Matrix,
        grad_output: &Matrix,
        l2: f64,
    ) -> Result<(Matrix, DenseGradients)> {
        if input.cols != self.input_units() || input.rows == 0 {
            return Err(NnError::ShapeMismatch {
                op: "dense backward input",
                expected: (input.rows.max(1), self.input_units()),
                found: input.shape(),
            });
        }
        if grad_output.shape() != (input.rows, self.output_units()) {
            return Err(NnError::ShapeMismatch {
                op: "dense backward gradient",
                expected: (input.rows, self.output_units()),
                found: grad_output.shape(),
            });
        }

        // Propagate with the weights as they were during the forward pass.
        let grad_input = grad_output.dot(&self.weights.transpose())?;

        let inv_m = 1.0 / input.rows as f64;
        let mut grad_weights = input.transpose().dot(grad_output)?.scale(inv_m);
        if l2 > 0.0 {
            grad_weights = grad_weights.zip_map(&self.weights, |g, w| g + l2 * w)?;
        }
        let grad_biases = grad_output.column_sums().scale(inv_m);

        Ok((grad_input, DenseGradients { weights: grad_weights, biases: grad_biases }))
    }

    /// Applies one optimizer step in place.
    pub fn apply_gradients(&mut self, grads: &DenseGradients, config: &TrainConfig) -> Result<()> {
        if grads.weights.shape() != self.weights.shape() {
            return Err(NnError::ShapeMismatch {
                op: "dense weight update",
                expected: self.weights.shape(),
                found: grads.weights.shape(),
            });
        }
        if grads.biases.shape() != self.biases.shape() {
            return Err(NnError::ShapeMismatch {
                op: "dense bias update",
                expected: self.biases.shape(),
                found: grads.biases.shape(),
            });
        }

        let lr = config.learning_rate;
        match config.optimizer {
            Optimizer::GradientDescent => {
                gradient_descent_step(&mut self.weights, &grads.weights, lr);
                gradient_descent_step(&mut self.biases, &grads.biases, lr);
            }
            Optimizer::RmsProp { decay, epsilon } => {
                let acc = self
                    .accumulators
                    .get_or_insert_with(|| Accumulators::zeros_for(&self.weights, &self.biases));
                rmsprop_step(&mut self.weights, &grads.weights, &mut acc.weights, lr, decay, epsilon);
                rmsprop_step(&mut self.biases, &grads.biases, &mut acc.biases, lr, decay, epsilon);
            }
        }
        Ok(())
    }

    /// False once any weight, bias or RMSProp accumulator is NaN or infinite.
    pub fn parameters_finite(&self) -> bool {
        let accumulators_finite = self
            .accumulators
            .as_ref()
            .map_or(true, |acc| acc.weights.is_finite() && acc.biases.is_finite());
        self.weights.is_finite() && self.biases.is_finite() && accumulators_finite
    }
}

impl Layer for Dense {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols != self.input_units() {
            return Err(NnError::ShapeMismatch {
                op: "dense forward",
                expected: (input.rows, self.input_units()),
                found: input.shape(),
            });
        }
        input.dot(&self.weights)?.add_row(&self.biases)
    }

    fn backward(&mut self, input: &Matrix, grad_output: &Matrix, config: &TrainConfig) -> Result<Matrix> {
        let (grad_input, grads) = self.compute_gradients(input, grad_output, config.l2)?;
        self.apply_gradients(&grads, config)?;
        Ok(grad_input)
    }
}
