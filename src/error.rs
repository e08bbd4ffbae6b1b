use thiserror::Error;

/// Crate-wide error type.
///
/// Every failure is a local precondition violation detected at the operation
/// boundary; nothing here is retried or silently coerced. Reading a gradient
/// that was never populated is deliberately *not* an error: `Tensor::grad()`
/// returns `Option<Tensor>` and callers check presence.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum FerrogradError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Target index {index} is out of range for {class_count} classes")]
    IndexOutOfRange { index: usize, class_count: usize },

    #[error("backward() called on a non-scalar tensor (shape {shape:?}) without an explicit seed gradient")]
    InvalidBackwardTarget { shape: Vec<usize> },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Operation requires tensor to require grad, but it doesn't")]
    RequiresGradNotMet,

    #[error("requires_grad can only be toggled on leaf tensors")]
    RequiresGradOnNonLeaf,

    #[error("Invalid learning rate {lr}: must be a positive finite value")]
    InvalidLearningRate { lr: f32 },

    #[error("Internal error: {0}")]
    InternalError(String),
}
