//! Negative log-likelihood loss over log-probabilities.

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::Tensor;

#[derive(Debug)]
struct NllBackward {
    log_probs: Tensor,
    targets: Vec<usize>,
    classes: usize,
}

impl BackwardOp for NllBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        let upstream = grad_output.item()?;
        let batch = self.targets.len();
        let scale = -upstream / batch as f32;
        let mut grad = vec![0.0f32; batch * self.classes];
        for (row, &target) in self.targets.iter().enumerate() {
            grad[row * self.classes + target] = scale;
        }
        Ok(vec![Tensor::new(grad, self.log_probs.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.log_probs.clone()]
    }
}

/// Negative log-likelihood: `-(1/n) Σ_k log_probs[k, t_k]`.
///
/// `log_probs` must be a `[batch, classes]` tensor of log-probabilities (i.e.
/// the output of `log_softmax_op`); `targets` must hold one class index per
/// row. An index at or beyond the class count fails with
/// [`FerrogradError::IndexOutOfRange`] before anything is computed.
pub fn nll_loss_op(log_probs: &Tensor, targets: &[usize]) -> Result<Tensor, FerrogradError> {
    let shape = log_probs.shape();
    if log_probs.rank() != 2 {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape,
            operation: "nll_loss_op (log_probs must be [batch, classes])".to_string(),
        });
    }
    let batch = shape[0];
    let classes = shape[1];
    if targets.len() != batch {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![batch],
            actual: vec![targets.len()],
            operation: "nll_loss_op (one target per batch row)".to_string(),
        });
    }
    if batch == 0 {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![1, classes],
            actual: shape,
            operation: "nll_loss_op (empty batch)".to_string(),
        });
    }
    for &target in targets {
        if target >= classes {
            return Err(FerrogradError::IndexOutOfRange {
                index: target,
                class_count: classes,
            });
        }
    }

    let data = log_probs.get_data();
    let picked: f32 = targets
        .iter()
        .enumerate()
        .map(|(row, &target)| data[row * classes + target])
        .sum();
    let loss = -picked / batch as f32;

    let output = Tensor::scalar(loss);
    if log_probs.requires_grad() {
        output.set_grad_fn(Arc::new(NllBackward {
            log_probs: log_probs.clone(),
            targets: targets.to_vec(),
            classes,
        }));
    }
    Ok(output)
}
