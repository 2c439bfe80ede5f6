use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{DivergenceSite, NnError, Result};
use crate::layers::dense::{Accumulators, Dense};
use crate::layers::layer::NetworkLayer;
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::network::Network;

/// Current on-disk schema version.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// One serialized layer. Dense layers carry their parameters and, once the
/// first RMSProp step has happened, their accumulators (`null` before that).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerRecord {
    Dense {
        weights: Matrix,
        biases: Matrix,
        #[serde(default)]
        accumulators: Option<Accumulators>,
    },
    Activation {
        function: ActivationFunction,
    },
}

/// Versioned JSON representation of a trained network.
///
/// ```text
/// { "version": 1,
///   "dims": [784, 100, 10],
///   "layers": [ {"type": "dense", "weights": {..}, "biases": {..}, "accumulators": null},
///               {"type": "activation", "function": "relu"}, .. ],
///   "metadata": {..} }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub version: u32,
    pub dims: Vec<usize>,
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl ModelFile {
    pub fn from_network(network: &Network, metadata: Option<ModelMetadata>) -> ModelFile {
        let layers = network
            .layers()
            .iter()
            .map(|layer| match layer {
                NetworkLayer::Dense(dense) => LayerRecord::Dense {
                    weights: dense.weights.clone(),
                    biases: dense.biases.clone(),
                    accumulators: dense.accumulators().cloned(),
                },
                NetworkLayer::Activation(function) => LayerRecord::Activation { function: *function },
            })
            .collect();
        ModelFile {
            version: MODEL_FORMAT_VERSION,
            dims: network.dims().to_vec(),
            layers,
            metadata,
        }
    }

    /// Rebuilds the network, validating every shape against `dims`.
    pub fn into_network(self) -> Result<Network> {
        check_version(self.version)?;
        let layers = self
            .layers
            .into_iter()
            .map(|record| match record {
                LayerRecord::Dense { weights, biases, accumulators } => {
                    Dense::from_parameters(weights, biases, accumulators).map(NetworkLayer::Dense)
                }
                LayerRecord::Activation { function } => Ok(NetworkLayer::Activation(function)),
            })
            .collect::<Result<Vec<_>>>()?;
        let network = Network::from_layers(layers)
            .map_err(|e| NnError::CorruptModel(e.to_string()))?;
        if network.dims() != self.dims.as_slice() {
            return Err(NnError::CorruptModel(format!(
                "declared dims {:?} do not match layer shapes {:?}",
                self.dims,
                network.dims()
            )));
        }
        Ok(network)
    }

    /// Serializes the model to a pretty-printed JSON file.
    ///
    /// JSON has no NaN or infinity, so a model holding one is refused with
    /// `NumericDivergence` and nothing is written to `path`.
    pub fn save_json(&self, path: &str) -> Result<()> {
        check_finite(&self.layers)?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a model file. The version is checked before the rest of the
    /// document is interpreted.
    pub fn load_json(path: &str) -> Result<ModelFile> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<ModelFile> {
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| NnError::CorruptModel("missing numeric 'version' field".to_owned()))?;
        check_version(u32::try_from(version).unwrap_or(u32::MAX))?;
        Ok(serde_json::from_value(value)?)
    }
}

fn check_finite(layers: &[LayerRecord]) -> Result<()> {
    let bad = layers.iter().position(|record| match record {
        LayerRecord::Dense { weights, biases, accumulators } => {
            !weights.is_finite()
                || !biases.is_finite()
                || accumulators
                    .as_ref()
                    .map_or(false, |acc| !acc.weights.is_finite() || !acc.biases.is_finite())
        }
        LayerRecord::Activation { .. } => false,
    });
    match bad {
        Some(index) => Err(NnError::NumericDivergence { site: DivergenceSite::Parameters, index }),
        None => Ok(()),
    }
}

fn check_version(found: u32) -> Result<()> {
    if found != MODEL_FORMAT_VERSION {
        return Err(NnError::UnsupportedVersion { found, expected: MODEL_FORMAT_VERSION });
    }
    Ok(())
}
