pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;

// Convenience re-exports
pub use error::{DivergenceSite, NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{Dense, DenseGradients, Layer, NetworkLayer};
pub use network::{ModelFile, ModelMetadata, Network, NetworkSpec};
pub use loss::{SoftmaxCrossEntropy, SquaredError, Targets};
pub use optim::Optimizer;
pub use train::{train_loop, train_loop_with, EpochStats, LoopConfig, TrainConfig, Trainer, TrainerState};
pub use data::Dataset;
