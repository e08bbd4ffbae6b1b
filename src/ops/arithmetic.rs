//! Elementwise arithmetic on identically-shaped tensors.
//!
//! No broadcasting: the only shape flexibility in this crate is the batch
//! handling spelled out by the individual ops (linear, loss), everything else
//! fails eagerly with `ShapeMismatch`.

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::ops::check_same_shape;
use crate::tensor::Tensor;

#[derive(Debug)]
struct AddBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for AddBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        // d(a+b)/da = d(a+b)/db = 1.
        Ok(vec![grad_output.clone(), grad_output.clone()])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

/// Elementwise addition `a + b`.
pub fn add_op(a: &Tensor, b: &Tensor) -> Result<Tensor, FerrogradError> {
    check_same_shape(a, b, "add_op")?;
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .zip(b.get_data().iter())
        .map(|(x, y)| x + y)
        .collect();
    let output = Tensor::new(data, a.shape())?;
    if a.requires_grad() || b.requires_grad() {
        output.set_grad_fn(Arc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
        }));
    }
    Ok(output)
}

#[derive(Debug)]
struct MulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MulBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        let g = grad_output.get_data();
        let a_data = self.a.get_data();
        let b_data = self.b.get_data();
        let grad_a: Vec<f32> = g.iter().zip(b_data.iter()).map(|(g, b)| g * b).collect();
        let grad_b: Vec<f32> = g.iter().zip(a_data.iter()).map(|(g, a)| g * a).collect();
        Ok(vec![
            Tensor::new(grad_a, self.a.shape())?,
            Tensor::new(grad_b, self.b.shape())?,
        ])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

/// Elementwise multiplication `a * b`.
pub fn mul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, FerrogradError> {
    check_same_shape(a, b, "mul_op")?;
    let data: Vec<f32> = a
        .get_data()
        .iter()
        .zip(b.get_data().iter())
        .map(|(x, y)| x * y)
        .collect();
    let output = Tensor::new(data, a.shape())?;
    if a.requires_grad() || b.requires_grad() {
        output.set_grad_fn(Arc::new(MulBackward {
            a: a.clone(),
            b: b.clone(),
        }));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::grad_check::check_grad;
    use crate::tensor::ones;

    fn leaf(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
        let t = Tensor::new(data, shape).unwrap();
        t.requires_grad_(true).unwrap();
        t
    }

    #[test]
    fn add_forward() {
        let a = Tensor::new(vec![1.0, 2.0, 3.0], vec![3]).unwrap();
        let b = Tensor::new(vec![10.0, 20.0, 30.0], vec![3]).unwrap();
        let out = add_op(&a, &b).unwrap();
        assert_eq!(out.get_data(), vec![11.0, 22.0, 33.0]);
        assert!(!out.requires_grad());
    }

    #[test]
    fn add_rejects_shape_mismatch() {
        let a = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
        let b = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        assert!(matches!(
            add_op(&a, &b),
            Err(FerrogradError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn mul_forward_and_requires_grad_propagation() {
        let a = leaf(vec![2.0, 3.0], vec![2]);
        let b = Tensor::new(vec![4.0, 5.0], vec![2]).unwrap();
        let out = mul_op(&a, &b).unwrap();
        assert_eq!(out.get_data(), vec![8.0, 15.0]);
        assert!(out.requires_grad());
        assert!(out.grad_fn().is_some());
    }

    #[test]
    fn add_grad_check() {
        let a = leaf(vec![0.4, -1.2, 2.5, 0.0], vec![2, 2]);
        let b = leaf(vec![1.1, 0.3, -0.7, 0.9], vec![2, 2]);
        let output_grad = ones(vec![2, 2]).unwrap();
        check_grad(
            |inputs| add_op(&inputs[0], &inputs[1]),
            &[a, b],
            &output_grad,
            1e-2,
            1e-2,
        )
        .unwrap();
    }

    #[test]
    fn mul_grad_check() {
        let a = leaf(vec![0.4, -1.2, 2.5, 0.6], vec![2, 2]);
        let b = leaf(vec![1.1, 0.3, -0.7, 0.9], vec![2, 2]);
        let output_grad = ones(vec![2, 2]).unwrap();
        check_grad(
            |inputs| mul_op(&inputs[0], &inputs[1]),
            &[a, b],
            &output_grad,
            1e-2,
            1e-2,
        )
        .unwrap();
    }
}
