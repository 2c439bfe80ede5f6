use rand::Rng;

use crate::error::{DivergenceSite, NnError, Result};
use crate::layers::dense::Dense;
use crate::layers::layer::{Layer, NetworkLayer};
use crate::math::matrix::Matrix;
use crate::network::spec::{LayerSpec, NetworkSpec};

/// Ordered list of layers. Forward runs front to back, backward back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    dims: Vec<usize>,
    layers: Vec<NetworkLayer>,
}

impl Network {
    /// Builds and initializes a network from its spec, drawing weights from `rng`.
    pub fn build<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Network> {
        let layers = spec
            .layer_plan()?
            .into_iter()
            .map(|step| match step {
                LayerSpec::Dense { input_units, output_units } => {
                    NetworkLayer::Dense(Dense::new(input_units, output_units, rng))
                }
                LayerSpec::Activation(function) => NetworkLayer::Activation(function),
            })
            .collect();
        Ok(Network { dims: spec.dims.clone(), layers })
    }

    /// Wraps existing layers after checking that they chain: the first layer
    /// is Dense, no Dense layer has a zero width, and every Dense input width
    /// equals the previous Dense output width.
    pub fn from_layers(layers: Vec<NetworkLayer>) -> Result<Network> {
        let mut dims: Vec<usize> = Vec::new();
        for (i, layer) in layers.iter().enumerate() {
            match layer {
                NetworkLayer::Dense(dense) => {
                    if dense.input_units() == 0 || dense.output_units() == 0 {
                        return Err(NnError::Configuration(format!(
                            "dense layer {} has zero width ({}x{})",
                            i,
                            dense.input_units(),
                            dense.output_units()
                        )));
                    }
                    if let Some(&previous) = dims.last() {
                        if previous != dense.input_units() {
                            return Err(NnError::Configuration(format!(
                                "dense layer {} expects {} inputs but the previous layer produces {}",
                                i,
                                dense.input_units(),
                                previous
                            )));
                        }
                    } else {
                        dims.push(dense.input_units());
                    }
                    dims.push(dense.output_units());
                }
                NetworkLayer::Activation(_) if i == 0 => {
                    return Err(NnError::Configuration(
                        "network must start with a dense layer".to_owned(),
                    ));
                }
                NetworkLayer::Activation(_) => {}
            }
        }
        if dims.is_empty() {
            return Err(NnError::Configuration("network has no layers".to_owned()));
        }
        Ok(Network { dims, layers })
    }

    /// Layer widths, `[input_dim, .., output_dim]`.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn input_dim(&self) -> usize {
        self.dims[0]
    }

    pub fn output_dim(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    pub fn layers(&self) -> &[NetworkLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [NetworkLayer] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Runs every layer and keeps all intermediate outputs.
    ///
    /// The result has `len() + 1` entries: position 0 is `input`, position
    /// `i + 1` is the output of layer `i`. Any non-finite value fails with
    /// `NumericDivergence` at the offending position.
    pub fn forward_cached(&self, input: &Matrix) -> Result<Vec<Matrix>> {
        if input.cols != self.input_dim() {
            return Err(NnError::ShapeMismatch {
                op: "network input",
                expected: (input.rows, self.input_dim()),
                found: input.shape(),
            });
        }
        ensure_finite(input, 0)?;

        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());
        for (i, layer) in self.layers.iter().enumerate() {
            let output = layer.forward(&activations[i])?;
            ensure_finite(&output, i + 1)?;
            activations.push(output);
        }
        debug_assert_eq!(activations.len(), self.layers.len() + 1);
        Ok(activations)
    }

    /// Final output only.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let mut activations = self.forward_cached(input)?;
        Ok(activations.pop().unwrap_or_default())
    }

    /// Argmax of the final output for every row.
    pub fn predict(&self, input: &Matrix) -> Result<Vec<usize>> {
        Ok(self.forward(input)?.argmax_rows())
    }

    /// ½ · Σ ‖W‖² over all Dense weight matrices.
    pub fn weight_penalty(&self) -> f64 {
        0.5 * self
            .layers
            .iter()
            .filter_map(NetworkLayer::as_dense)
            .map(|dense| dense.weights.squared_norm())
            .sum::<f64>()
    }

    /// Index of the first layer holding a NaN or infinite parameter.
    pub fn first_non_finite_layer(&self) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.as_dense().map_or(false, |d| !d.parameters_finite()))
    }
}

fn ensure_finite(activation: &Matrix, position: usize) -> Result<()> {
    if activation.is_finite() {
        Ok(())
    } else {
        Err(NnError::NumericDivergence { site: DivergenceSite::Activation, index: position })
    }
}
