// End-to-end training behaviour: idempotent forward, monotone descent, the
// 2-3-1 backprop scenario and a full training loop.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rmsnet::activation::ActivationFunction;
use rmsnet::optim::Optimizer;
use rmsnet::{
    train_loop, Dataset, DenseGradients, LoopConfig, Matrix, NetworkSpec, Targets, TrainConfig,
    Trainer,
};

fn blobs(n: usize, rng: &mut ChaCha8Rng) -> Dataset {
    let centers = [(-1.5, -1.5), (1.5, -1.5), (0.0, 1.5)];
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % centers.len();
        let (cx, cy) = centers[label];
        rows.push(vec![cx + rng.gen_range(-0.4..0.4), cy + rng.gen_range(-0.4..0.4)]);
        labels.push(label);
    }
    Dataset::new(Matrix::from_rows(rows).unwrap(), labels).unwrap()
}

fn shift(trainer: &mut Trainer, grads: &[Option<DenseGradients>], factor: f64) {
    let config = TrainConfig::new(factor.abs()).with_optimizer(Optimizer::GradientDescent);
    let sign = -factor.signum();
    for (layer, g) in trainer.network_mut().layers_mut().iter_mut().zip(grads) {
        if let (Some(dense), Some(g)) = (layer.as_dense_mut(), g) {
            let signed = DenseGradients { weights: g.weights.scale(sign), biases: g.biases.scale(sign) };
            dense.apply_gradients(&signed, &config).unwrap();
        }
    }
}

#[test]
fn forward_is_bit_identical_across_calls() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let data = blobs(20, &mut rng);
    let trainer = Trainer::with_seed(&[2, 16, 16, 3], 1).unwrap();
    let first = trainer.network().forward(&data.inputs).unwrap();
    let second = trainer.network().forward(&data.inputs).unwrap();
    let first_bits: Vec<u64> = first.values().map(f64::to_bits).collect();
    let second_bits: Vec<u64> = second.values().map(f64::to_bits).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn full_batch_gradient_descent_decreases_loss() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let data = blobs(30, &mut rng);
    let mut trainer = Trainer::with_seed(&[2, 10, 3], 2).unwrap();
    let config = TrainConfig::new(0.05).with_optimizer(Optimizer::GradientDescent);

    let losses: Vec<f64> = (0..50)
        .map(|_| trainer.fit(&data.inputs, &data.labels, &config).unwrap())
        .collect();
    for pair in losses.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "loss rose from {} to {}", pair[0], pair[1]);
    }
    assert!(losses[49] < losses[0]);
}

#[test]
fn stepping_along_the_gradient_raises_cost_and_back_lowers_it() {
    let spec = NetworkSpec::classifier(&[2, 3, 1])
        .with_hidden_activation(ActivationFunction::Sigmoid)
        .with_output_activation(ActivationFunction::Sigmoid);
    let mut trainer = Trainer::new(&spec, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
    let x = Matrix::from_rows(vec![
        vec![0.546, 0.654],
        vec![0.786, 0.876],
        vec![0.984, 0.884],
    ])
    .unwrap();
    let y = Matrix::from_rows(vec![vec![0.78], vec![0.89], vec![0.71]]).unwrap();

    let cost1 = trainer.loss(&x, Targets::Values(&y), 0.0).unwrap();
    let grads = trainer.gradients(&x, Targets::Values(&y), 0.0).unwrap();
    shift(&mut trainer, &grads, 3.0);
    let cost2 = trainer.loss(&x, Targets::Values(&y), 0.0).unwrap();
    assert!(cost2 > cost1, "cost1={} cost2={}", cost1, cost2);

    let grads = trainer.gradients(&x, Targets::Values(&y), 0.0).unwrap();
    shift(&mut trainer, &grads, -3.0);
    let cost3 = trainer.loss(&x, Targets::Values(&y), 0.0).unwrap();
    assert!(cost3 < cost2, "cost2={} cost3={}", cost2, cost3);
    // The step back lands close to where it started.
    assert!(
        (cost3 - cost1).abs() < 0.25 * (cost2 - cost1),
        "cost1={} cost2={} cost3={}",
        cost1,
        cost2,
        cost3
    );
}

#[test]
fn regression_fit_reduces_squared_error() {
    let spec = NetworkSpec::classifier(&[2, 3, 1])
        .with_hidden_activation(ActivationFunction::Sigmoid)
        .with_output_activation(ActivationFunction::Sigmoid);
    let mut trainer = Trainer::new(&spec, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
    let x = Matrix::from_rows(vec![vec![0.3, 0.5], vec![0.5, 1.0], vec![1.0, 0.2]]).unwrap();
    let y = Matrix::from_rows(vec![vec![0.75], vec![0.82], vec![0.93]]).unwrap();
    let config = TrainConfig::new(0.01).with_l2(1e-4);

    let before = trainer.loss(&x, Targets::Values(&y), config.l2).unwrap();
    for _ in 0..300 {
        trainer.fit_regression(&x, &y, &config).unwrap();
    }
    let after = trainer.loss(&x, Targets::Values(&y), config.l2).unwrap();
    assert!(after < before, "before={} after={}", before, after);
}

#[test]
fn training_loop_separates_three_blobs() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut train = blobs(300, &mut rng);
    let val = train.split_off_last(60).unwrap();
    let mut trainer = Trainer::with_seed(&[2, 16, 3], 4).unwrap();

    let history = train_loop(
        &mut trainer,
        &train,
        Some(&val),
        &TrainConfig::new(0.01),
        &LoopConfig::new(15, 16),
        &mut rng,
    )
    .unwrap();

    let last = history.last().unwrap();
    assert_eq!(last.total_epochs, 15);
    assert!(last.train_accuracy > 0.95, "train acc {}", last.train_accuracy);
    assert!(last.val_accuracy.unwrap() > 0.95);
    assert!(!trainer.is_diverged());
}
