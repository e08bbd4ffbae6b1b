use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::autograd::graph::NodeId;
use crate::error::FerrogradError;
use crate::tensor_data::TensorData;

mod autograd_methods;
pub mod create;

pub use create::{full, ones, ones_like, randn, zeros, zeros_like};

/// A dense f32 array of rank at most 2, with optional gradient tracking.
///
/// `Tensor` is a cheap-clone handle over `Arc<RwLock<TensorData>>`:
/// 1. **Shared ownership**: clones point at the same buffer, so a parameter
///    held by a layer and by the optimizer is one storage.
/// 2. **Interior mutability**: autograd metadata (`requires_grad`, `grad`)
///    is updated through immutable handles via the `RwLock`.
///
/// The tensor that an operation outputs exclusively owns its producing graph
/// node through `grad_fn`; the node in turn holds handles to the operation's
/// inputs, which is what keeps the graph alive for `backward()`.
pub struct Tensor {
    pub(crate) data: Arc<RwLock<TensorData>>,
}

impl Tensor {
    /// Creates a tensor from a flat row-major buffer and a shape.
    ///
    /// Fails with [`FerrogradError::TensorCreationError`] if the buffer length
    /// disagrees with the shape.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, FerrogradError> {
        let tensor_data = TensorData::new(data, shape)?;
        Ok(Tensor {
            data: Arc::new(RwLock::new(tensor_data)),
        })
    }

    /// Creates a scalar tensor (empty shape, one element).
    pub fn scalar(value: f32) -> Self {
        Tensor {
            data: Arc::new(RwLock::new(
                TensorData::new(vec![value], vec![]).expect("scalar shape is always valid"),
            )),
        }
    }

    /// Returns a clone of the tensor's shape.
    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    /// Returns the rank (number of dimensions).
    pub fn rank(&self) -> usize {
        self.read_data().shape.len()
    }

    /// Returns the number of elements.
    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Returns an owned copy of the flattened element buffer.
    pub fn get_data(&self) -> Vec<f32> {
        self.read_data().data.clone()
    }

    /// Extracts the single value of a one-element tensor.
    pub fn item(&self) -> Result<f32, FerrogradError> {
        let guard = self.read_data();
        if guard.numel() != 1 {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![],
                actual: guard.shape.clone(),
                operation: "item()".to_string(),
            });
        }
        Ok(guard.data[0])
    }

    /// Reads the element at `[row, col]` of a rank-2 tensor. Test/inspection
    /// helper; panics on out-of-bounds rather than returning an error.
    pub fn at(&self, row: usize, col: usize) -> f32 {
        let guard = self.read_data();
        assert_eq!(guard.shape.len(), 2, "at() requires a rank-2 tensor");
        assert!(row < guard.shape[0] && col < guard.shape[1]);
        guard.data[row * guard.shape[1] + col]
    }

    /// Acquires a read lock on the underlying `TensorData`.
    pub fn read_data(&self) -> RwLockReadGuard<'_, TensorData> {
        self.data.read().expect("Tensor RwLock poisoned")
    }

    /// Acquires a write lock on the underlying `TensorData`.
    pub fn write_data(&self) -> RwLockWriteGuard<'_, TensorData> {
        self.data.write().expect("Tensor RwLock poisoned")
    }

    /// Stable identity of this tensor's storage, used to key graph traversal.
    pub(crate) fn node_id(&self) -> NodeId {
        Arc::as_ptr(&self.data)
    }
}

impl Clone for Tensor {
    /// Clones the handle, not the data.
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data),
        }
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.read_data();
        f.debug_struct("Tensor")
            .field("shape", &guard.shape)
            .field("requires_grad", &guard.requires_grad)
            .field("has_grad", &guard.grad.is_some())
            .field("is_leaf", &guard.grad_fn.is_none())
            .field("data", &guard.data)
            .finish()
    }
}
