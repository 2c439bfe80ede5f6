use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::optim::optimizer::Optimizer;

/// Hyperparameters consumed by every layer's `backward` call.
///
/// # Fields
/// - `learning_rate`: step size, must be positive
/// - `optimizer`    : update rule (`RmsProp` by default, or `GradientDescent`)
/// - `l2`           : weight-decay strength λ; adds λ/2·‖W‖² to the loss and
///                     λ·W to each weight gradient. `0.0` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub optimizer: Optimizer,
    pub l2: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.001,
            optimizer: Optimizer::default(),
            l2: 0.0,
        }
    }
}

impl TrainConfig {
    /// Default RMSProp configuration with the given learning rate.
    pub fn new(learning_rate: f64) -> Self {
        TrainConfig { learning_rate, ..TrainConfig::default() }
    }

    pub fn with_optimizer(mut self, optimizer: Optimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(NnError::Configuration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2 >= 0.0 && self.l2.is_finite()) {
            return Err(NnError::Configuration(format!(
                "l2 strength must be non-negative, got {}",
                self.l2
            )));
        }
        self.optimizer.validate()
    }

    /// Reads a config from JSON. Missing fields fall back to the defaults.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

/// Epoch/minibatch schedule for `train_loop`.
///
/// - `epochs`    : full passes over the training data
/// - `batch_size`: rows per `fit` call; the last batch may be smaller
/// - `shuffle`   : reshuffle row order at the start of every epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig { epochs: 10, batch_size: 64, shuffle: true }
    }
}

impl LoopConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        LoopConfig { epochs, batch_size, shuffle: true }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NnError::Configuration("batch_size must be at least 1".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = TrainConfig::default();
        assert_eq!(c.learning_rate, 0.001);
        assert_eq!(c.optimizer, Optimizer::RmsProp { decay: 0.9, epsilon: 1e-7 });
        assert_eq!(c.l2, 0.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        assert!(TrainConfig::new(0.0).validate().is_err());
        assert!(TrainConfig::new(f64::NAN).validate().is_err());
        assert!(TrainConfig::new(0.1).with_l2(-1.0).validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let c: TrainConfig =
            serde_json::from_str(r#"{"learning_rate": 0.5, "optimizer": {"kind": "gradient_descent"}}"#)
                .unwrap();
        assert_eq!(c.learning_rate, 0.5);
        assert_eq!(c.optimizer, Optimizer::GradientDescent);
        assert_eq!(c.l2, 0.0);

        let l: LoopConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();
        assert_eq!(l, LoopConfig { epochs: 3, batch_size: 64, shuffle: true });
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(LoopConfig::new(1, 0).validate().is_err());
    }
}
