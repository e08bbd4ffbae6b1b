use std::fmt;
use std::ops::Deref;

use crate::tensor::Tensor;

/// A learnable tensor owned by a layer.
///
/// Wrapping a tensor as a `Parameter` permanently enables gradient tracking.
/// Cloning shares storage (the handle is an `Arc`), which is how the layer and
/// the optimizer end up mutating one buffer: the model owns its parameters,
/// the optimizer holds non-owning handles to the same set, and nothing else
/// writes to parameter data.
pub struct Parameter(Tensor);

impl Parameter {
    /// Wraps a leaf tensor, turning on gradient tracking.
    ///
    /// Panics if handed a non-leaf tensor; parameters are created from fresh
    /// buffers, never from op outputs.
    pub fn new(tensor: Tensor) -> Self {
        tensor
            .requires_grad_(true)
            .expect("parameters must be leaf tensors");
        Parameter(tensor)
    }

    /// The underlying tensor handle.
    pub fn tensor(&self) -> &Tensor {
        &self.0
    }
}

impl Deref for Parameter {
    type Target = Tensor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Clone for Parameter {
    /// Shallow clone: both handles address the same storage.
    fn clone(&self) -> Self {
        Parameter(self.0.clone())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({:?})", self.0)
    }
}
