pub mod metadata;
pub mod model_file;
pub mod network;
pub mod spec;

pub use metadata::{InputType, ModelMetadata};
pub use model_file::{LayerRecord, ModelFile, MODEL_FORMAT_VERSION};
pub use network::Network;
pub use spec::{LayerSpec, NetworkSpec};
