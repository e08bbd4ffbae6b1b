//! Autograd-facing methods on [`Tensor`]: gradient access, accumulation and
//! the entry point of the backward pass.

use std::sync::Arc;

use crate::autograd::graph::run_backward;
use crate::autograd::BackwardOp;
use crate::error::FerrogradError;
use crate::tensor::{create, Tensor};

impl Tensor {
    /// Whether gradients are tracked for this tensor.
    pub fn requires_grad(&self) -> bool {
        self.read_data().requires_grad
    }

    /// Toggles gradient tracking in place. Only allowed on leaf tensors;
    /// non-leaf tensors get their tracking state from the operation that
    /// produced them.
    pub fn requires_grad_(&self, requires_grad: bool) -> Result<(), FerrogradError> {
        let mut guard = self.write_data();
        if guard.grad_fn.is_some() {
            return Err(FerrogradError::RequiresGradOnNonLeaf);
        }
        guard.requires_grad = requires_grad;
        Ok(())
    }

    /// Returns the accumulated gradient, if any backward pass has populated it.
    ///
    /// `None` before the first backward pass (or after `zero_grad`) is normal,
    /// documented behavior, not an error.
    pub fn grad(&self) -> Option<Tensor> {
        self.read_data().grad.clone()
    }

    /// Returns the producing graph node, or `None` for leaves.
    pub fn grad_fn(&self) -> Option<Arc<dyn BackwardOp>> {
        self.read_data().grad_fn.clone()
    }

    /// Attaches a producing node and enables gradient tracking on this tensor.
    /// Called by every differentiable operation when at least one input is
    /// tracked.
    pub(crate) fn set_grad_fn(&self, grad_fn: Arc<dyn BackwardOp>) {
        let mut guard = self.write_data();
        guard.grad_fn = Some(grad_fn);
        guard.requires_grad = true;
    }

    /// Adds `contribution` into this tensor's gradient buffer, allocating the
    /// buffer on first use. Gradients accumulate, they are never overwritten:
    /// a tensor consumed in several places in the graph receives the sum of
    /// all its consumers' contributions, and a second `backward()` without an
    /// intervening `zero_grad()` doubles the stored values.
    pub fn acc_grad(&self, contribution: Tensor) -> Result<(), FerrogradError> {
        let contrib_shape = contribution.shape();
        if contrib_shape != self.shape() {
            return Err(FerrogradError::ShapeMismatch {
                expected: self.shape(),
                actual: contrib_shape,
                operation: "acc_grad".to_string(),
            });
        }
        let contrib_data = contribution.get_data();
        let existing = self.read_data().grad.clone();
        match existing {
            Some(grad) => {
                let mut guard = grad.write_data();
                for (dst, src) in guard.data.iter_mut().zip(contrib_data.iter()) {
                    *dst += *src;
                }
            }
            None => {
                // Fresh buffer, decoupled from the contribution's storage.
                let fresh = Tensor::new(contrib_data, contrib_shape)?;
                self.write_data().grad = Some(fresh);
            }
        }
        Ok(())
    }

    /// Drops the gradient buffer. The next accumulation re-allocates it.
    pub fn zero_grad(&self) {
        self.write_data().grad = None;
    }

    /// Runs reverse-mode differentiation from this tensor down to every leaf.
    ///
    /// With `gradient = None` the tensor must be a scalar and the seed is 1;
    /// calling without a seed on a non-scalar is a usage error
    /// ([`FerrogradError::InvalidBackwardTarget`]). An explicit seed must match
    /// this tensor's shape exactly.
    pub fn backward(&self, gradient: Option<Tensor>) -> Result<(), FerrogradError> {
        if !self.requires_grad() {
            return Err(FerrogradError::RequiresGradNotMet);
        }
        let seed = match gradient {
            Some(seed) => {
                if seed.shape() != self.shape() {
                    return Err(FerrogradError::ShapeMismatch {
                        expected: self.shape(),
                        actual: seed.shape(),
                        operation: "backward (seed gradient)".to_string(),
                    });
                }
                seed
            }
            None => {
                if self.numel() != 1 {
                    return Err(FerrogradError::InvalidBackwardTarget {
                        shape: self.shape(),
                    });
                }
                create::ones_like(self)?
            }
        };
        if self.read_data().grad_fn.is_none() {
            log::debug!("backward() called on a leaf tensor; seeding its gradient directly");
            return self.acc_grad(seed);
        }
        run_backward(self, seed)
    }
}
