//! Tensor creation helpers.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Creates a tensor of the given shape filled with `value`.
pub fn full(shape: Vec<usize>, value: f32) -> Result<Tensor, FerrogradError> {
    let numel: usize = shape.iter().product();
    Tensor::new(vec![value; numel], shape)
}

/// Creates a tensor of zeros.
pub fn zeros(shape: Vec<usize>) -> Result<Tensor, FerrogradError> {
    full(shape, 0.0)
}

/// Creates a tensor of ones.
pub fn ones(shape: Vec<usize>) -> Result<Tensor, FerrogradError> {
    full(shape, 1.0)
}

/// Creates a zero tensor with the same shape as `other`.
pub fn zeros_like(other: &Tensor) -> Result<Tensor, FerrogradError> {
    zeros(other.shape())
}

/// Creates a ones tensor with the same shape as `other`.
pub fn ones_like(other: &Tensor) -> Result<Tensor, FerrogradError> {
    ones(other.shape())
}

/// Creates a tensor of the given shape with standard-normal samples drawn
/// from `rng`. Used for synthetic data; parameter init lives in `nn::init`.
pub fn randn<R: Rng>(shape: Vec<usize>, rng: &mut R) -> Result<Tensor, FerrogradError> {
    let numel: usize = shape.iter().product();
    let data: Vec<f32> = (0..numel).map(|_| rng.sample(StandardNormal)).collect();
    Tensor::new(data, shape)
}
