//! End-to-end training behaviour: one fully hand-checked SGD step on a tiny
//! model, and loss descent on a separable dataset.

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrograd::model::Sequential;
use ferrograd::nn::layers::{Layer, Linear, LogSoftmax};
use ferrograd::nn::Module;
use ferrograd::ops::loss::nll_loss_op;
use ferrograd::optim::{Optimizer, Sgd};
use ferrograd::train::{fit, predict_proba, train_epoch, Batch, TrainConfig};
use ferrograd::Tensor;

/// Linear(2 -> 2) with identity weight and zero bias, followed by
/// log-softmax. Every quantity below is computable by hand.
fn identity_classifier() -> Sequential {
    let weight = Tensor::new(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]).unwrap();
    let bias = Tensor::new(vec![0.0, 0.0], vec![2]).unwrap();
    let mut model = Sequential::new();
    model.push(Layer::Linear(Linear::from_parts(weight, bias).unwrap()));
    model.push(Layer::LogSoftmax(LogSoftmax::new()));
    model
}

#[test]
fn hand_checked_forward_and_loss() {
    let model = identity_classifier();
    let input = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();

    let log_probs = model.forward(&input).unwrap();
    // log_softmax([1, 2]) = [1 - lse, 2 - lse] with lse = 2 + ln(1 + e^-1)
    assert_abs_diff_eq!(log_probs.at(0, 0), -1.3132617, epsilon = 1e-5);
    assert_abs_diff_eq!(log_probs.at(0, 1), -0.3132617, epsilon = 1e-5);

    let loss = nll_loss_op(&log_probs, &[1]).unwrap();
    assert_abs_diff_eq!(loss.item().unwrap(), 0.3132617, epsilon = 1e-5);
}

#[test]
fn hand_checked_sgd_step() {
    let model = identity_classifier();
    let params = model.parameters();
    let mut optimizer = Sgd::new(params.clone(), 0.1).unwrap();

    let input = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    let loss = nll_loss_op(&model.forward(&input).unwrap(), &[1]).unwrap();
    loss.backward(None).unwrap();
    optimizer.step().unwrap();

    // dL/dlogits = softmax([1, 2]) - onehot(1) = [s, -s] with s = 0.26894143.
    // Weight grad is the outer product with the input [1, 2]; bias grad is
    // the logit grad itself. One step with lr = 0.1:
    let s = 0.26894143f32;
    let weight = params[0].get_data();
    assert_abs_diff_eq!(weight[0], 1.0 - 0.1 * s, epsilon = 1e-5);
    assert_abs_diff_eq!(weight[1], 0.0 - 0.1 * s * 2.0, epsilon = 1e-5);
    assert_abs_diff_eq!(weight[2], 0.0 + 0.1 * s, epsilon = 1e-5);
    assert_abs_diff_eq!(weight[3], 1.0 + 0.1 * s * 2.0, epsilon = 1e-5);
    let bias = params[1].get_data();
    assert_abs_diff_eq!(bias[0], -0.1 * s, epsilon = 1e-5);
    assert_abs_diff_eq!(bias[1], 0.1 * s, epsilon = 1e-5);

    // The step must have lowered the loss on the same example.
    let after = nll_loss_op(&model.forward(&input).unwrap(), &[1]).unwrap();
    assert!(after.item().unwrap() < 0.3132617);
}

#[test]
fn repeated_backward_without_zero_grad_accumulates() {
    let model = identity_classifier();
    let params = model.parameters();
    let input = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();

    let loss = nll_loss_op(&model.forward(&input).unwrap(), &[1]).unwrap();
    loss.backward(None).unwrap();
    let first = params[1].grad().unwrap().get_data();
    loss.backward(None).unwrap();
    let second = params[1].grad().unwrap().get_data();
    for (a, b) in first.iter().zip(second.iter()) {
        assert_abs_diff_eq!(2.0 * a, *b, epsilon = 1e-6);
    }
}

#[test]
fn zero_grad_clears_the_whole_model() {
    let model = identity_classifier();
    let params = model.parameters();
    let mut optimizer = Sgd::new(params.clone(), 0.1).unwrap();

    let input = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
    let loss = nll_loss_op(&model.forward(&input).unwrap(), &[1]).unwrap();
    loss.backward(None).unwrap();
    assert!(params.iter().all(|p| p.grad().is_some()));

    optimizer.zero_grad();
    assert!(params.iter().all(|p| p.grad().is_none()));
}

/// Two well-separated point clouds in the plane.
fn separable_batch() -> Batch {
    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    for i in 0..8 {
        let offset = 0.1 * i as f32;
        inputs.extend_from_slice(&[2.0 + offset, 2.0 - offset]);
        targets.push(0);
        inputs.extend_from_slice(&[-2.0 - offset, -2.0 + offset]);
        targets.push(1);
    }
    Batch::new(Tensor::new(inputs, vec![16, 2]).unwrap(), targets).unwrap()
}

#[test]
fn fit_descends_on_separable_data() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = TrainConfig {
        learning_rate: 0.1,
        epochs: 20,
        layer_widths: vec![8, 2],
    };
    let model = Sequential::mlp(2, &config.layer_widths, &mut rng).unwrap();
    let batch = separable_batch();

    let losses = fit(&model, &config, &[batch.clone()]).unwrap();
    assert_eq!(losses.len(), 20);
    assert!(losses.iter().all(|l| l.is_finite()));

    // SGD on a single full batch is not strictly monotonic step to step, so
    // require the 5-epoch moving average to never increase instead.
    let averages: Vec<f32> = losses
        .windows(5)
        .map(|w| w.iter().sum::<f32>() / 5.0)
        .collect();
    for pair in averages.windows(2) {
        assert!(
            pair[1] <= pair[0],
            "moving average rose: {} -> {}",
            pair[0],
            pair[1]
        );
    }

    // The trained model should put most probability mass on the right class.
    let probs = predict_proba(&model, batch.inputs()).unwrap();
    let classes = probs.shape()[1];
    let data = probs.get_data();
    let mut correct = 0;
    for (row, &target) in batch.targets().iter().enumerate() {
        let row_probs = &data[row * classes..(row + 1) * classes];
        let argmax = row_probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        if argmax == target {
            correct += 1;
        }
    }
    assert!(correct >= 14, "expected near-perfect fit, got {correct}/16");
}

#[test]
fn train_epoch_loss_matches_mean_over_batches() {
    let mut rng = StdRng::seed_from_u64(7);
    let model = Sequential::mlp(2, &[4, 2], &mut rng).unwrap();
    let mut optimizer = Sgd::new(model.parameters(), 0.01).unwrap();

    let batch_a = Batch::new(
        Tensor::new(vec![1.0, 0.5, -0.5, 1.0], vec![2, 2]).unwrap(),
        vec![0, 1],
    )
    .unwrap();
    let batch_b = Batch::new(
        Tensor::new(vec![0.2, -1.0], vec![1, 2]).unwrap(),
        vec![1],
    )
    .unwrap();

    let mean = train_epoch(&model, &mut optimizer, &[batch_a, batch_b]).unwrap();
    assert!(mean.is_finite() && mean >= 0.0);
}
