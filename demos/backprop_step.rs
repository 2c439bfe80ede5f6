//! One hand-driven gradient step on a 2 → 3 → 1 sigmoid regression net.
//!
//! Moving the weights *along* the gradient raises the cost; moving them back
//! against it lowers the cost again.

use rmsnet::activation::ActivationFunction;
use rmsnet::optim::Optimizer;
use rmsnet::{DenseGradients, Matrix, NetworkSpec, Targets, TrainConfig, Trainer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STEP: f64 = 3.0;

fn main() -> rmsnet::Result<()> {
    let spec = NetworkSpec::classifier(&[2, 3, 1])
        .with_hidden_activation(ActivationFunction::Sigmoid)
        .with_output_activation(ActivationFunction::Sigmoid);
    let mut trainer = Trainer::new(&spec, &mut ChaCha8Rng::seed_from_u64(7))?;

    let x = Matrix::from_rows(vec![
        vec![0.546, 0.654],
        vec![0.786, 0.876],
        vec![0.984, 0.884],
    ])?;
    let y = Matrix::from_rows(vec![vec![0.78], vec![0.89], vec![0.71]])?;

    let cost1 = trainer.loss(&x, Targets::Values(&y), 0.0)?;
    let grads = trainer.gradients(&x, Targets::Values(&y), 0.0)?;
    for (i, g) in grads.iter().enumerate() {
        if let Some(g) = g {
            println!("dJ/dW{}: {:?}", i / 2 + 1, g.weights.data);
        }
    }

    shift(&mut trainer, &grads, STEP)?;
    let cost2 = trainer.loss(&x, Targets::Values(&y), 0.0)?;

    let grads = trainer.gradients(&x, Targets::Values(&y), 0.0)?;
    shift(&mut trainer, &grads, -STEP)?;
    let cost3 = trainer.loss(&x, Targets::Values(&y), 0.0)?;

    println!("cost1 = {cost1:.6}");
    println!("cost2 = {cost2:.6}  (after +{STEP}·gradient)");
    println!("cost3 = {cost3:.6}  (after -{STEP}·gradient)");
    Ok(())
}

/// `W += factor · dJ/dW` for every Dense layer.
fn shift(trainer: &mut Trainer, grads: &[Option<DenseGradients>], factor: f64) -> rmsnet::Result<()> {
    let config = TrainConfig::new(factor.abs()).with_optimizer(Optimizer::GradientDescent);
    let sign = -factor.signum();
    for (layer, g) in trainer.network_mut().layers_mut().iter_mut().zip(grads) {
        if let (Some(dense), Some(g)) = (layer.as_dense_mut(), g) {
            let signed = DenseGradients { weights: g.weights.scale(sign), biases: g.biases.scale(sign) };
            dense.apply_gradients(&signed, &config)?;
        }
    }
    Ok(())
}
