use std::fmt::Debug;

use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// The backward rule of a differentiable operation.
///
/// Every operation that outputs a tracked tensor attaches one implementor of
/// this trait to the output's `grad_fn`. The implementor owns handles to the
/// operation's input tensors (plus whatever forward-pass context the rule
/// needs), which is what keeps the computation graph reachable from the loss.
///
/// `Debug + Send + Sync` because the node is stored behind an
/// `Arc<dyn BackwardOp>` inside tensor metadata.
pub trait BackwardOp: Debug + Send + Sync {
    /// Applies the chain rule for this operation: given dL/dOutput, returns
    /// dL/dInput_i for every input, in the same order as [`BackwardOp::inputs`].
    ///
    /// Each returned gradient must have exactly the shape of the corresponding
    /// input; the traversal in `autograd::graph` enforces this.
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, FerrogradError>;

    /// The operation's input tensors, in the order matching
    /// [`BackwardOp::backward`]'s output.
    fn inputs(&self) -> Vec<Tensor>;
}
