use serde::{Serialize, Deserialize};

/// What `train_loop` measured after one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Counts from 1.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Minibatch losses (taken before each update) averaged per sample.
    pub train_loss: f64,
    /// Fraction of training rows classified correctly after the epoch.
    pub train_accuracy: f64,
    /// Loss and accuracy on the held-out rows, when there are any.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
    pub elapsed_ms: u64,
}
