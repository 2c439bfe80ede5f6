pub mod layer;
pub mod dense;

pub use layer::{Layer, NetworkLayer};
pub use dense::{Accumulators, Dense, DenseGradients};
