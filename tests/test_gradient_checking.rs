// Finite-difference checks of the analytic gradients: the loss alone and the
// full network, for a ReLU classifier and a sigmoid regression net.

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rmsnet::activation::ActivationFunction;
use rmsnet::{Matrix, NetworkSpec, SoftmaxCrossEntropy, Targets, Trainer};

const EPS: f64 = 1e-5;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn random_matrix(rows: usize, cols: usize, rng: &mut ChaCha8Rng) -> Matrix {
    let data = (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    Matrix::from_rows(data).unwrap()
}

// Which parameter of a Dense layer to perturb.
#[derive(Clone, Copy)]
enum Param {
    Weight(usize, usize),
    Bias(usize),
}

fn nudge(trainer: &mut Trainer, layer: usize, param: Param, delta: f64) {
    let dense = trainer.network_mut().layers_mut()[layer].as_dense_mut().unwrap();
    match param {
        Param::Weight(r, c) => dense.weights.data[r][c] += delta,
        Param::Bias(c) => dense.biases.data[0][c] += delta,
    }
}

/// Compares every parameter gradient against a central difference of `loss`.
fn check_network(trainer: &mut Trainer, x: &Matrix, targets: Targets<'_>, l2: f64) {
    let analytic = trainer.gradients(x, targets, l2).unwrap();
    let mut checked = 0;

    for (layer, grads) in analytic.iter().enumerate() {
        let Some(grads) = grads else { continue };
        let (rows, cols) = grads.weights.shape();
        let params = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Param::Weight(r, c)))
            .chain((0..cols).map(Param::Bias));

        for param in params {
            nudge(trainer, layer, param, EPS);
            let plus = trainer.loss(x, targets, l2).unwrap();
            nudge(trainer, layer, param, -2.0 * EPS);
            let minus = trainer.loss(x, targets, l2).unwrap();
            nudge(trainer, layer, param, EPS);

            let numeric = (plus - minus) / (2.0 * EPS);
            let exact = match param {
                Param::Weight(r, c) => grads.weights.data[r][c],
                Param::Bias(c) => grads.biases.data[0][c],
            };
            assert_relative_eq!(exact, numeric, max_relative = 1e-3, epsilon = 1e-7);
            checked += 1;
        }
    }
    assert!(checked > 0);
}

fn sigmoid_regression_net(seed: u64) -> Trainer {
    let spec = NetworkSpec::classifier(&[2, 3, 1])
        .with_hidden_activation(ActivationFunction::Sigmoid)
        .with_output_activation(ActivationFunction::Sigmoid);
    Trainer::new(&spec, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap()
}

fn scenario_data() -> (Matrix, Matrix) {
    let x = Matrix::from_rows(vec![
        vec![0.546, 0.654],
        vec![0.786, 0.876],
        vec![0.984, 0.884],
    ])
    .unwrap();
    let y = Matrix::from_rows(vec![vec![0.78], vec![0.89], vec![0.71]]).unwrap();
    (x, y)
}

#[test]
fn softmax_cross_entropy_gradient_matches_central_differences() {
    let values: Vec<f64> = (0..500).map(|i| -1.0 + 2.0 * i as f64 / 499.0).collect();
    let logits = Matrix::from_rows(values.chunks(10).map(<[f64]>::to_vec).collect()).unwrap();
    let labels: Vec<usize> = (0..50).map(|i| i % 10).collect();

    let grad = SoftmaxCrossEntropy::grad(&logits, &labels).unwrap();
    for r in 0..50 {
        for c in 0..10 {
            let mut plus = logits.clone();
            plus.data[r][c] += EPS;
            let mut minus = logits.clone();
            minus.data[r][c] -= EPS;
            let numeric = (mean(&SoftmaxCrossEntropy::loss(&plus, &labels).unwrap())
                - mean(&SoftmaxCrossEntropy::loss(&minus, &labels).unwrap()))
                / (2.0 * EPS);
            assert_relative_eq!(grad.data[r][c], numeric, max_relative = 1e-3, epsilon = 1e-9);
        }
    }
}

#[test]
fn relu_classifier_gradients_match_central_differences() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut trainer = Trainer::with_seed(&[4, 6, 5, 3], 3).unwrap();
    let x = random_matrix(7, 4, &mut rng);
    let labels: Vec<usize> = (0..7).map(|i| i % 3).collect();
    check_network(&mut trainer, &x, Targets::Labels(&labels), 0.0);
}

#[test]
fn sigmoid_regression_gradients_match_central_differences() {
    let (x, y) = scenario_data();
    let mut trainer = sigmoid_regression_net(11);
    check_network(&mut trainer, &x, Targets::Values(&y), 0.0);
}

#[test]
fn l2_penalty_gradients_match_central_differences() {
    let (x, y) = scenario_data();
    let mut trainer = sigmoid_regression_net(12);
    check_network(&mut trainer, &x, Targets::Values(&y), 0.1);

    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut classifier = Trainer::with_seed(&[3, 4, 2], 13).unwrap();
    let inputs = random_matrix(5, 3, &mut rng);
    let labels = [0, 1, 1, 0, 1];
    check_network(&mut classifier, &inputs, Targets::Labels(&labels), 0.05);
}
