use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};

/// One step of the layer plan derived from a `NetworkSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSpec {
    Dense { input_units: usize, output_units: usize },
    Activation(ActivationFunction),
}

/// Architecture of a network as a list of widths.
///
/// - `dims`             : `[input_dim, hidden.., outputs]`; at least two entries.
///                         Each consecutive pair becomes one Dense layer.
/// - `hidden_activation`: inserted after every Dense layer except the last.
/// - `output_activation`: optional nonlinearity after the last Dense layer.
///                         Leave unset for classifiers, whose final Dense
///                         layer produces logits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub dims: Vec<usize>,
    #[serde(default = "default_hidden_activation")]
    pub hidden_activation: ActivationFunction,
    #[serde(default)]
    pub output_activation: Option<ActivationFunction>,
}

fn default_hidden_activation() -> ActivationFunction {
    ActivationFunction::ReLU
}

impl NetworkSpec {
    /// ReLU classifier ending in raw logits.
    pub fn classifier(dims: &[usize]) -> NetworkSpec {
        NetworkSpec {
            dims: dims.to_vec(),
            hidden_activation: ActivationFunction::ReLU,
            output_activation: None,
        }
    }

    pub fn with_hidden_activation(mut self, activation: ActivationFunction) -> Self {
        self.hidden_activation = activation;
        self
    }

    pub fn with_output_activation(mut self, activation: ActivationFunction) -> Self {
        self.output_activation = Some(activation);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dims.len() < 2 {
            return Err(NnError::Configuration(format!(
                "network needs at least an input and an output width, got {:?}",
                self.dims
            )));
        }
        if let Some(pos) = self.dims.iter().position(|&d| d == 0) {
            return Err(NnError::Configuration(format!(
                "layer width at position {} is zero in {:?}",
                pos, self.dims
            )));
        }
        Ok(())
    }

    pub fn input_dim(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    pub fn output_dim(&self) -> usize {
        self.dims.last().copied().unwrap_or(0)
    }

    /// Ordered layer plan: Dense, activation, Dense, activation, ..., Dense
    /// (then the output activation, if any).
    pub fn layer_plan(&self) -> Result<Vec<LayerSpec>> {
        self.validate()?;
        let dense_count = self.dims.len() - 1;
        let mut plan = Vec::with_capacity(dense_count * 2);
        for (i, pair) in self.dims.windows(2).enumerate() {
            plan.push(LayerSpec::Dense { input_units: pair[0], output_units: pair[1] });
            if i + 1 < dense_count {
                plan.push(LayerSpec::Activation(self.hidden_activation));
            }
        }
        if let Some(output) = self.output_activation {
            plan.push(LayerSpec::Activation(output));
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_inserts_activation_between_dense_layers() {
        let plan = NetworkSpec::classifier(&[4, 8, 6, 3]).layer_plan().unwrap();
        assert_eq!(
            plan,
            vec![
                LayerSpec::Dense { input_units: 4, output_units: 8 },
                LayerSpec::Activation(ActivationFunction::ReLU),
                LayerSpec::Dense { input_units: 8, output_units: 6 },
                LayerSpec::Activation(ActivationFunction::ReLU),
                LayerSpec::Dense { input_units: 6, output_units: 3 },
            ]
        );
    }

    #[test]
    fn two_widths_make_a_single_dense_layer() {
        let plan = NetworkSpec::classifier(&[5, 2]).layer_plan().unwrap();
        assert_eq!(plan, vec![LayerSpec::Dense { input_units: 5, output_units: 2 }]);
    }

    #[test]
    fn regression_variant_ends_with_output_activation() {
        let spec = NetworkSpec::classifier(&[2, 3, 1])
            .with_hidden_activation(ActivationFunction::Sigmoid)
            .with_output_activation(ActivationFunction::Sigmoid);
        let plan = spec.layer_plan().unwrap();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[3], LayerSpec::Activation(ActivationFunction::Sigmoid));
    }

    #[test]
    fn too_few_or_zero_widths_are_configuration_errors() {
        assert!(matches!(
            NetworkSpec::classifier(&[3]).validate(),
            Err(NnError::Configuration(_))
        ));
        assert!(matches!(
            NetworkSpec::classifier(&[]).layer_plan(),
            Err(NnError::Configuration(_))
        ));
        assert!(NetworkSpec::classifier(&[3, 0, 2]).validate().is_err());
    }

    #[test]
    fn json_defaults_to_relu_classifier() {
        let spec: NetworkSpec = serde_json::from_str(r#"{"dims": [784, 100, 10]}"#).unwrap();
        assert_eq!(spec, NetworkSpec::classifier(&[784, 100, 10]));
    }
}
