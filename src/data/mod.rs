pub mod dataset;
pub mod idx;
pub mod imaging;

pub use dataset::Dataset;
pub use idx::{load_idx_pair, parse_idx_pair};
