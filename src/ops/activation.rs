//! Elementwise and row-wise activations: ReLU and log-softmax.

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::Tensor;

#[derive(Debug)]
struct ReluBackward {
    input: Tensor,
}

impl BackwardOp for ReluBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        // Gradient passes where the input was strictly positive; an input of
        // exactly zero gets gradient zero (the standard tie-break).
        let grad: Vec<f32> = self
            .input
            .get_data()
            .iter()
            .zip(grad_output.get_data().iter())
            .map(|(x, g)| if *x > 0.0 { *g } else { 0.0 })
            .collect();
        Ok(vec![Tensor::new(grad, self.input.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }
}

/// Rectified linear unit, `y_i = max(0, x_i)`.
pub fn relu_op(input: &Tensor) -> Result<Tensor, FerrogradError> {
    let data: Vec<f32> = input.get_data().iter().map(|x| x.max(0.0)).collect();
    let output = Tensor::new(data, input.shape())?;
    if input.requires_grad() {
        output.set_grad_fn(Arc::new(ReluBackward {
            input: input.clone(),
        }));
    }
    Ok(output)
}

#[derive(Debug)]
struct LogSoftmaxBackward {
    input: Tensor,
    // Forward result kept as a plain buffer: storing the output Tensor here
    // would create a reference cycle through its own grad_fn.
    log_probs: Vec<f32>,
    classes: usize,
}

impl BackwardOp for LogSoftmaxBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        let g = grad_output.get_data();
        let rows = self.log_probs.len() / self.classes;
        let mut grad = vec![0.0f32; self.log_probs.len()];
        for row in 0..rows {
            let base = row * self.classes;
            let row_sum: f32 = g[base..base + self.classes].iter().sum();
            for c in 0..self.classes {
                // grad_x = g - softmax(x) * Σ_c g, per row.
                grad[base + c] = g[base + c] - self.log_probs[base + c].exp() * row_sum;
            }
        }
        Ok(vec![Tensor::new(grad, self.input.shape())?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }
}

/// Log-softmax along the class (last) axis of a `[batch, classes]` tensor:
/// `y_i = x_i - log(Σ_j exp(x_j))`, computed with the row-max shift so that
/// arbitrarily large logits do not overflow the exponentials.
pub fn log_softmax_op(input: &Tensor) -> Result<Tensor, FerrogradError> {
    let shape = input.shape();
    if input.rank() != 2 || shape[1] == 0 {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape,
            operation: "log_softmax_op (input must be [batch, classes])".to_string(),
        });
    }
    let classes = shape[1];
    let x = input.get_data();
    let mut out = vec![0.0f32; x.len()];
    for row in 0..shape[0] {
        let base = row * classes;
        let row_slice = &x[base..base + classes];
        let max = row_slice.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let log_sum_exp: f32 = row_slice.iter().map(|v| (v - max).exp()).sum::<f32>().ln();
        for c in 0..classes {
            out[base + c] = x[base + c] - max - log_sum_exp;
        }
    }

    let log_probs = out.clone();
    let output = Tensor::new(out, shape)?;
    if input.requires_grad() {
        output.set_grad_fn(Arc::new(LogSoftmaxBackward {
            input: input.clone(),
            log_probs,
            classes,
        }));
    }
    Ok(output)
}
