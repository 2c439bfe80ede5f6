pub mod evaluate;
pub mod predict;
pub mod serve;
pub mod train;

use anyhow::{Context, Result};
use rmsnet::Trainer;

/// Loads a saved model, attaching the path to any error.
pub fn load_model(path: &str) -> Result<Trainer> {
    Trainer::load_json(path).with_context(|| format!("failed to load model from {}", path))
}
