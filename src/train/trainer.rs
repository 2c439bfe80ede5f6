use log::{debug, error};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{DivergenceSite, NnError, Result};
use crate::layers::dense::DenseGradients;
use crate::layers::layer::Layer;
use crate::loss::targets::Targets;
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::model_file::ModelFile;
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::train::train_config::TrainConfig;

/// Lifecycle of a trainer. A diverged trainer refuses further steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Assembled,
    Diverged { site: DivergenceSite, index: usize },
}

/// Owns a network and runs forward/backward steps on it.
///
/// Each `fit` call is one full forward pass, one loss evaluation and one
/// backward sweep that updates every Dense layer in place. Nothing besides
/// the network (and its layers' accumulators) survives between calls.
#[derive(Debug, Clone)]
pub struct Trainer {
    network: Network,
    state: TrainerState,
    metadata: Option<ModelMetadata>,
}

impl Trainer {
    pub fn new<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Trainer> {
        Ok(Trainer::from_network(Network::build(spec, rng)?))
    }

    /// ReLU classifier over `dims`, initialized from a seeded ChaCha generator.
    pub fn with_seed(dims: &[usize], seed: u64) -> Result<Trainer> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Trainer::new(&NetworkSpec::classifier(dims), &mut rng)
    }

    pub fn from_network(network: Network) -> Trainer {
        Trainer { network, state: TrainerState::Assembled, metadata: None }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Direct parameter access, e.g. for gradient checking.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self.state, TrainerState::Diverged { .. })
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: ModelMetadata) {
        self.metadata = Some(metadata);
    }

    /// One training step on a classification batch. Returns the mean loss
    /// measured before the update.
    pub fn fit(&mut self, inputs: &Matrix, labels: &[usize], config: &TrainConfig) -> Result<f64> {
        self.step(inputs, Targets::Labels(labels), config)
    }

    /// One training step against real-valued targets (half squared error).
    pub fn fit_regression(&mut self, inputs: &Matrix, targets: &Matrix, config: &TrainConfig) -> Result<f64> {
        self.step(inputs, Targets::Values(targets), config)
    }

    pub fn step(&mut self, inputs: &Matrix, targets: Targets<'_>, config: &TrainConfig) -> Result<f64> {
        if let TrainerState::Diverged { site, index } = self.state {
            return Err(NnError::NumericDivergence { site, index });
        }
        config.validate()?;
        check_batch(inputs, &targets)?;

        let activations = self.track(self.network.forward_cached(inputs))?;
        let logits = &activations[activations.len() - 1];

        let loss = mean(&targets.per_example_loss(logits)?) + penalty(&self.network, config.l2);
        if !loss.is_finite() {
            return self.track(Err(NnError::NumericDivergence { site: DivergenceSite::Loss, index: 0 }));
        }

        // Layer i consumes activations[i], the input it saw on the way forward.
        let mut grad = targets.output_gradient(logits)?;
        for (i, layer) in self.network.layers_mut().iter_mut().enumerate().rev() {
            grad = layer.backward(&activations[i], &grad, config)?;
        }

        if let Some(index) = self.network.first_non_finite_layer() {
            return self.track(Err(NnError::NumericDivergence {
                site: DivergenceSite::Parameters,
                index,
            }));
        }

        debug!("step: batch={} loss={:.6}", inputs.rows, loss);
        Ok(loss)
    }

    /// Mean loss (plus the L2 penalty) without touching any parameter.
    pub fn loss(&self, inputs: &Matrix, targets: Targets<'_>, l2: f64) -> Result<f64> {
        check_batch(inputs, &targets)?;
        let output = self.network.forward(inputs)?;
        Ok(mean(&targets.per_example_loss(&output)?) + penalty(&self.network, l2))
    }

    /// Gradient of `loss` w.r.t. every Dense layer's parameters, one entry per
    /// layer (`None` for activations). Parameters are left unchanged.
    pub fn gradients(&self, inputs: &Matrix, targets: Targets<'_>, l2: f64) -> Result<Vec<Option<DenseGradients>>> {
        check_batch(inputs, &targets)?;
        let activations = self.network.forward_cached(inputs)?;
        let logits = &activations[activations.len() - 1];

        let mut grad = targets.output_gradient(logits)?;
        let mut per_layer = vec![None; self.network.len()];
        for (i, layer) in self.network.layers().iter().enumerate().rev() {
            let (grad_input, params) = layer.propagate(&activations[i], &grad, l2)?;
            per_layer[i] = params;
            grad = grad_input;
        }
        Ok(per_layer)
    }

    /// Index of the largest output for every row.
    pub fn predict(&self, inputs: &Matrix) -> Result<Vec<usize>> {
        self.network.predict(inputs)
    }

    /// Fraction of rows whose prediction equals the label.
    pub fn accuracy(&self, inputs: &Matrix, labels: &[usize]) -> Result<f64> {
        if labels.len() != inputs.rows {
            return Err(NnError::ShapeMismatch {
                op: "accuracy labels",
                expected: (inputs.rows, 1),
                found: (labels.len(), 1),
            });
        }
        if labels.is_empty() {
            return Ok(0.0);
        }
        let correct = self
            .predict(inputs)?
            .iter()
            .zip(labels.iter())
            .filter(|(p, l)| p == l)
            .count();
        Ok(correct as f64 / labels.len() as f64)
    }

    /// Writes the network, including optimizer accumulators, to `path`.
    ///
    /// A diverged trainer is refused with its recorded `NumericDivergence`, so
    /// an earlier checkpoint at `path` is never replaced by a broken model.
    pub fn save_json(&self, path: &str) -> Result<()> {
        if let TrainerState::Diverged { site, index } = self.state {
            return Err(NnError::NumericDivergence { site, index });
        }
        ModelFile::from_network(&self.network, self.metadata.clone()).save_json(path)
    }

    pub fn load_json(path: &str) -> Result<Trainer> {
        let file = ModelFile::load_json(path)?;
        let metadata = file.metadata.clone();
        let mut trainer = Trainer::from_network(file.into_network()?);
        trainer.metadata = metadata;
        Ok(trainer)
    }

    /// Records a divergence before handing the error back.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(NnError::NumericDivergence { site, index }) = &result {
            error!("training diverged: non-finite {} at index {}", site, index);
            self.state = TrainerState::Diverged { site: *site, index: *index };
        }
        result
    }
}

fn check_batch(inputs: &Matrix, targets: &Targets<'_>) -> Result<()> {
    if inputs.rows == 0 {
        return Err(NnError::ShapeMismatch {
            op: "batch",
            expected: (1, inputs.cols),
            found: inputs.shape(),
        });
    }
    if targets.len() != inputs.rows {
        return Err(NnError::ShapeMismatch {
            op: "batch targets",
            expected: (inputs.rows, 1),
            found: (targets.len(), 1),
        });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn penalty(network: &Network, l2: f64) -> f64 {
    if l2 > 0.0 { l2 * network.weight_penalty() } else { 0.0 }
}
