use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Default decay for the squared-gradient moving average.
pub const DEFAULT_DECAY: f64 = 0.9;
/// Default stabilizer added to `sqrt(g2)` before dividing.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Update rule applied by every learnable layer during `backward`.
///
/// - `GradientDescent`: `param -= lr · grad`.
/// - `RmsProp`        : keeps an exponential moving average `g2` of squared
///   gradients per parameter and divides each step by `sqrt(g2) + epsilon`,
///   which bounds the effective step size even when raw gradient magnitudes
///   differ by orders of magnitude across parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Optimizer {
    GradientDescent,
    RmsProp { decay: f64, epsilon: f64 },
}

impl Default for Optimizer {
    fn default() -> Self {
        Optimizer::RmsProp { decay: DEFAULT_DECAY, epsilon: DEFAULT_EPSILON }
    }
}

impl Optimizer {
    /// Parses the short names used on the command line: `rmsprop` or `gd`.
    pub fn from_name(name: &str) -> Result<Optimizer> {
        match name {
            "rmsprop" => Ok(Optimizer::default()),
            "gd" => Ok(Optimizer::GradientDescent),
            other => Err(NnError::Configuration(format!(
                "unknown optimizer '{}' (expected 'rmsprop' or 'gd')",
                other
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Optimizer::RmsProp { decay, epsilon } = *self {
            if !(decay > 0.0 && decay < 1.0) {
                return Err(NnError::Configuration(format!(
                    "rmsprop decay must lie in (0, 1), got {}",
                    decay
                )));
            }
            if !(epsilon > 0.0 && epsilon.is_finite()) {
                return Err(NnError::Configuration(format!(
                    "rmsprop epsilon must be positive, got {}",
                    epsilon
                )));
            }
        }
        Ok(())
    }
}

/// `param -= lr · grad`. Shapes must already agree.
pub fn gradient_descent_step(param: &mut Matrix, grad: &Matrix, lr: f64) {
    for (p_row, g_row) in param.data.iter_mut().zip(grad.data.iter()) {
        for (p, g) in p_row.iter_mut().zip(g_row.iter()) {
            *p -= lr * g;
        }
    }
}

/// One RMSProp step:
///   g2 ← decay·g2 + (1 − decay)·grad²
///   param -= lr·grad / (sqrt(g2) + epsilon)
///
/// `param`, `grad` and `g2` must share a shape.
pub fn rmsprop_step(
    param: &mut Matrix,
    grad: &Matrix,
    g2: &mut Matrix,
    lr: f64,
    decay: f64,
    epsilon: f64,
) {
    let rows = param.data.iter_mut().zip(grad.data.iter()).zip(g2.data.iter_mut());
    for ((p_row, g_row), acc_row) in rows {
        for ((p, g), acc) in p_row.iter_mut().zip(g_row.iter()).zip(acc_row.iter_mut()) {
            *acc = *acc * decay + g * g * (1.0 - decay);
            *p -= lr * g / (acc.sqrt() + epsilon);
        }
    }
}
