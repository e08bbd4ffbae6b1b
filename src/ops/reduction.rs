//! Full reductions to a scalar (empty shape).

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::{full, Tensor};

#[derive(Debug)]
struct SumBackward {
    input: Tensor,
}

impl BackwardOp for SumBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        // d(Σx)/dx_i = 1: broadcast the upstream scalar over the input shape.
        let upstream = grad_output.item()?;
        Ok(vec![full(self.input.shape(), upstream)?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }
}

/// Sum of all elements, as a scalar tensor.
pub fn sum_op(input: &Tensor) -> Result<Tensor, FerrogradError> {
    let total: f32 = input.get_data().iter().sum();
    let output = Tensor::scalar(total);
    if input.requires_grad() {
        output.set_grad_fn(Arc::new(SumBackward {
            input: input.clone(),
        }));
    }
    Ok(output)
}

#[derive(Debug)]
struct MeanBackward {
    input: Tensor,
    n: f32,
}

impl BackwardOp for MeanBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        let upstream = grad_output.item()?;
        Ok(vec![full(self.input.shape(), upstream / self.n)?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }
}

/// Mean of all elements, as a scalar tensor. Empty tensors are rejected.
pub fn mean_op(input: &Tensor) -> Result<Tensor, FerrogradError> {
    let n = input.numel();
    if n == 0 {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![1],
            actual: input.shape(),
            operation: "mean_op (empty tensor)".to_string(),
        });
    }
    let total: f32 = input.get_data().iter().sum();
    let output = Tensor::scalar(total / n as f32);
    if input.requires_grad() {
        output.set_grad_fn(Arc::new(MeanBackward {
            input: input.clone(),
            n: n as f32,
        }));
    }
    Ok(output)
}
