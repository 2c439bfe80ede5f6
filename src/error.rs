use std::fmt;

/// Where a non-finite value was first observed during a training step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceSite {
    /// Position in the activation cache (0 is the raw input).
    Activation,
    /// The scalar loss of the step.
    Loss,
    /// Parameters of the layer at the given index, after its update.
    Parameters,
}

impl fmt::Display for DivergenceSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceSite::Activation => write!(f, "activation"),
            DivergenceSite::Loss => write!(f, "loss"),
            DivergenceSite::Parameters => write!(f, "parameters"),
        }
    }
}

/// Every failure the library can report.
#[derive(Debug, thiserror::Error)]
pub enum NnError {
    #[error("shape mismatch in {op}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("label {label} at row {row} is outside [0, {num_classes})")]
    InvalidLabel {
        row: usize,
        label: usize,
        num_classes: usize,
    },

    #[error("non-finite value in {site} at index {index}; lower the learning rate and restart from a checkpoint")]
    NumericDivergence { site: DivergenceSite, index: usize },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unsupported model format version {found} (this build reads version {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt model file: {0}")]
    CorruptModel(String),

    #[error("malformed dataset: {0}")]
    Dataset(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, NnError>;
