//! Differentiable operations.
//!
//! Each operation is a free function `xxx_op(...) -> Result<Tensor, FerrogradError>`
//! that computes the forward value eagerly and, when any input is tracked,
//! attaches a `XxxBackward` node to the output. The supported operation set is
//! closed: elementwise arithmetic, the fused linear map, ReLU, log-softmax,
//! scalar reductions, and the NLL loss.

pub mod activation;
pub mod arithmetic;
pub mod linalg;
pub mod loss;
pub mod reduction;

use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Rejects mismatched elementwise operands.
pub(crate) fn check_same_shape(
    a: &Tensor,
    b: &Tensor,
    operation: &str,
) -> Result<(), FerrogradError> {
    let a_shape = a.shape();
    let b_shape = b.shape();
    if a_shape != b_shape {
        return Err(FerrogradError::ShapeMismatch {
            expected: a_shape,
            actual: b_shape,
            operation: operation.to_string(),
        });
    }
    Ok(())
}
