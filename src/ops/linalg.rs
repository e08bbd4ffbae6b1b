//! The fused affine map `y = x·Wᵗ + b` and its backward rule.

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Dense row-major `[m,k] x [k,n] -> [m,n]` kernel, shared by forward and
/// backward. Callers guarantee the dimensions.
fn matmul(a: &[f32], m: usize, k: usize, b: &[f32], n: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; m * n];
    for i in 0..m {
        for l in 0..k {
            let a_il = a[i * k + l];
            if a_il == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i * n + j] += a_il * b[l * n + j];
            }
        }
    }
    out
}

#[derive(Debug)]
struct LinearBackward {
    input: Tensor,
    weight: Tensor,
    bias: Tensor,
}

impl BackwardOp for LinearBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError> {
        let input_shape = self.input.shape();
        let weight_shape = self.weight.shape();
        let batch = input_shape[0];
        let in_features = input_shape[1];
        let out_features = weight_shape[0];

        let g_shape = grad_output.shape();
        if g_shape != vec![batch, out_features] {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![batch, out_features],
                actual: g_shape,
                operation: "linear_op backward (upstream gradient)".to_string(),
            });
        }

        let g = grad_output.get_data();
        let x = self.input.get_data();
        let w = self.weight.get_data();

        // grad_x = g · W          ([batch,out] x [out,in] -> [batch,in])
        let grad_input = matmul(&g, batch, out_features, &w, in_features);

        // grad_W[j,k] = Σ_i g[i,j] · x[i,k]   (gᵗ · x, summed over the batch)
        let mut grad_weight = vec![0.0f32; out_features * in_features];
        for i in 0..batch {
            for j in 0..out_features {
                let g_ij = g[i * out_features + j];
                if g_ij == 0.0 {
                    continue;
                }
                for k in 0..in_features {
                    grad_weight[j * in_features + k] += g_ij * x[i * in_features + k];
                }
            }
        }

        // grad_b = Σ_batch g
        let mut grad_bias = vec![0.0f32; out_features];
        for i in 0..batch {
            for j in 0..out_features {
                grad_bias[j] += g[i * out_features + j];
            }
        }

        Ok(vec![
            Tensor::new(grad_input, vec![batch, in_features])?,
            Tensor::new(grad_weight, vec![out_features, in_features])?,
            Tensor::new(grad_bias, vec![out_features])?,
        ])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone(), self.weight.clone(), self.bias.clone()]
    }
}

/// Affine transformation `y = x·Wᵗ + b`.
///
/// Shapes: `input [batch, in]`, `weight [out, in]`, `bias [out]`, output
/// `[batch, out]`. Any disagreement is a [`FerrogradError::ShapeMismatch`];
/// in particular an input whose trailing dimension differs from the weight's
/// column count is rejected here rather than producing garbage downstream.
pub fn linear_op(input: &Tensor, weight: &Tensor, bias: &Tensor) -> Result<Tensor, FerrogradError> {
    let input_shape = input.shape();
    let weight_shape = weight.shape();
    let bias_shape = bias.shape();

    if input.rank() != 2 {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![0, 0],
            actual: input_shape,
            operation: "linear_op (input must be rank 2: [batch, features])".to_string(),
        });
    }
    if weight_shape.len() != 2 || input_shape[1] != weight_shape[1] {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![weight_shape.first().copied().unwrap_or(0), input_shape[1]],
            actual: weight_shape,
            operation: "linear_op (weight columns must match input features)".to_string(),
        });
    }
    if bias_shape != vec![weight_shape[0]] {
        return Err(FerrogradError::ShapeMismatch {
            expected: vec![weight_shape[0]],
            actual: bias_shape,
            operation: "linear_op (bias must match weight rows)".to_string(),
        });
    }

    let batch = input_shape[0];
    let in_features = input_shape[1];
    let out_features = weight_shape[0];

    let x = input.get_data();
    let w = weight.get_data();
    let b = bias.get_data();

    // y[i,j] = Σ_k x[i,k]·w[j,k] + b[j]; W is stored [out,in], so this is x·Wᵗ.
    let mut out = vec![0.0f32; batch * out_features];
    for i in 0..batch {
        for j in 0..out_features {
            let mut acc = b[j];
            for k in 0..in_features {
                acc += x[i * in_features + k] * w[j * in_features + k];
            }
            out[i * out_features + j] = acc;
        }
    }

    let output = Tensor::new(out, vec![batch, out_features])?;
    if input.requires_grad() || weight.requires_grad() || bias.requires_grad() {
        output.set_grad_fn(Arc::new(LinearBackward {
            input: input.clone(),
            weight: weight.clone(),
            bias: bias.clone(),
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
    fn linear_forward_exact() {
        // x [1,3], W [2,3], b [2]: y = x·Wᵗ + b
        let x = Tensor::new(vec![10.0, 20.0, 30.0], vec![1, 3]).unwrap();
        let w = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let b = Tensor::new(vec![0.1, 0.2], vec![2]).unwrap();
        let y = linear_op(&x, &w, &b).unwrap();
        assert_eq!(y.shape(), vec![1, 2]);
        let data = y.get_data();
        assert!((data[0] - 140.1).abs() < 1e-6);
        assert!((data[1] - 320.2).abs() < 1e-6);
    }

    #[test]
    fn linear_rejects_feature_mismatch() {
        let x = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let w = Tensor::new(vec![1.0, 2.0, 3.0], vec![1, 3]).unwrap();
        let b = Tensor::new(vec![0.0], vec![1]).unwrap();
        assert!(matches!(
            linear_op(&x, &w, &b),
            Err(FerrogradError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn linear_rejects_rank_one_input() {
        let x = Tensor::new(vec![1.0, 2.0], vec![2]).unwrap();
        let w = Tensor::new(vec![1.0, 2.0], vec![1, 2]).unwrap();
        let b = Tensor::new(vec![0.0], vec![1]).unwrap();
        assert!(matches!(
            linear_op(&x, &w, &b),
            Err(FerrogradError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn linear_backward_values() {
        let x = leaf(vec![10.0, 20.0], vec![1, 2]);
        let w = leaf(vec![3.0, 4.0], vec![1, 2]);
        let b = leaf(vec![0.1], vec![1]);
        let y = linear_op(&x, &w, &b).unwrap();
        assert!((y.get_data()[0] - 110.1).abs() < 1e-4);
        y.backward(Some(ones(vec![1, 1]).unwrap())).unwrap();
        assert_eq!(x.grad().unwrap().get_data(), vec![3.0, 4.0]);
        assert_eq!(w.grad().unwrap().get_data(), vec![10.0, 20.0]);
        assert_eq!(b.grad().unwrap().get_data(), vec![1.0]);
    }

    #[test]
    fn linear_bias_gradient_sums_over_batch() {
        let x = leaf(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let w = leaf(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]);
        let b = leaf(vec![0.0, 0.0], vec![2]);
        let y = linear_op(&x, &w, &b).unwrap();
        y.backward(Some(ones(vec![2, 2]).unwrap())).unwrap();
        assert_eq!(b.grad().unwrap().get_data(), vec![2.0, 2.0]);
    }

    #[test]
    fn linear_grad_check() {
        let x = leaf(vec![0.5, -0.3, 1.2, 0.8, -1.1, 0.2], vec![2, 3]);
        let w = leaf(vec![0.1, -0.4, 0.7, 0.3, 0.9, -0.2, -0.6, 0.5, 0.4, 0.0, 0.2, -0.8], vec![4, 3]);
        let b = leaf(vec![0.05, -0.1, 0.2, 0.3], vec![4]);
        let output_grad = ones(vec![2, 4]).unwrap();
        check_grad(
            |inputs| linear_op(&inputs[0], &inputs[1], &inputs[2]),
            &[x, w, b],
            &output_grad,
            1e-2,
            1e-2,
        )
        .unwrap();
    }
}
