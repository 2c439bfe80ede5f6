pub mod cross_entropy;
pub mod squared_error;
pub mod targets;

pub use cross_entropy::SoftmaxCrossEntropy;
pub use squared_error::SquaredError;
pub use targets::Targets;
