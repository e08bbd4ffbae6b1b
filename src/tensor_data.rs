use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Internal storage and metadata for a [`Tensor`].
///
/// Holds the dense f32 buffer, the shape, and the autograd bookkeeping.
/// Always wrapped in `Arc<RwLock<TensorData>>` by the `Tensor` handle, which
/// gives shared ownership plus interior mutability for `grad` / `requires_grad`.
///
/// Storage is row-major and contiguous; rank is at most 2 (an empty shape is a
/// scalar). There are no strides, views or broadcasting: every operation states
/// exactly which shapes it accepts.
#[derive(Debug)]
pub struct TensorData {
    /// Flattened row-major element buffer.
    pub(crate) data: Vec<f32>,
    /// Tensor dimensions. Empty for scalars.
    pub(crate) shape: Vec<usize>,
    /// If true, operations on this tensor record graph nodes and the backward
    /// pass accumulates into `grad`.
    pub(crate) requires_grad: bool,
    /// Accumulated gradient, same shape as `data`. Allocated lazily by the
    /// first accumulation; reset to `None` by `zero_grad`.
    pub(crate) grad: Option<Tensor>,
    /// The operation that produced this tensor, or `None` for leaves
    /// (user-created inputs and parameters).
    pub(crate) grad_fn: Option<Arc<dyn BackwardOp>>,
}

impl TensorData {
    /// Builds a `TensorData` from a flat buffer and a shape, checking that the
    /// element count agrees with the shape's product.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, FerrogradError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(FerrogradError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        if shape.len() > 2 {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![],
                actual: shape,
                operation: "TensorData::new (rank must be <= 2)".to_string(),
            });
        }
        Ok(TensorData {
            data,
            shape,
            requires_grad: false,
            grad: None,
            grad_fn: None,
        })
    }

    /// Number of elements. The empty shape (scalar) has one element.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}
