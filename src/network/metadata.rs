use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
/// Stored in the model file; the CLI reads it to preprocess inference input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Raw numeric feature vectors.
    Numeric,
    /// Grayscale image resized to width×height, normalized to [0, 1].
    ImageGrayscale { width: u32, height: u32 },
}

impl InputType {
    /// Square grayscale images when `input_dim` is a perfect square, otherwise
    /// plain numeric input.
    pub fn infer(input_dim: usize) -> InputType {
        let side = (input_dim as f64).sqrt().round() as usize;
        if side > 1 && side * side == input_dim {
            InputType::ImageGrayscale { width: side as u32, height: side as u32 }
        } else {
            InputType::Numeric
        }
    }
}

/// Optional annotations attached to a saved model.
/// All fields are Option<> so files without metadata deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    pub input_type: Option<InputType>,
    /// Human-readable class labels for the output layer (e.g. ["0","1",...,"9"]).
    pub output_labels: Option<Vec<String>>,
}

impl ModelMetadata {
    /// Display name for class `index`, falling back to the index itself.
    pub fn label_for(&self, index: usize) -> String {
        self.output_labels
            .as_ref()
            .and_then(|labels| labels.get(index).cloned())
            .unwrap_or_else(|| index.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_square_images() {
        assert_eq!(InputType::infer(784), InputType::ImageGrayscale { width: 28, height: 28 });
        assert_eq!(InputType::infer(2), InputType::Numeric);
        assert_eq!(InputType::infer(1), InputType::Numeric);
    }

    #[test]
    fn label_falls_back_to_index() {
        let meta = ModelMetadata {
            output_labels: Some(vec!["cat".into(), "dog".into()]),
            ..ModelMetadata::default()
        };
        assert_eq!(meta.label_for(1), "dog");
        assert_eq!(meta.label_for(7), "7");
    }
}
