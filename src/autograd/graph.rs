//! Reverse topological traversal of the computation graph.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::FerrogradError;
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;

/// Stable identity of a tensor's storage; tensors are graph vertices and two
/// handles over the same `Arc` are the same vertex.
pub(crate) type NodeId = *const RwLock<TensorData>;

/// Post-order (inputs before outputs) listing of every tensor reachable from
/// `root` through `grad_fn` edges. Iterative to keep deep chains off the call
/// stack.
fn topo_sort(root: &Tensor) -> Vec<Tensor> {
    let mut sorted: Vec<Tensor> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<(Tensor, bool)> = vec![(root.clone(), false)];

    while let Some((tensor, expanded)) = stack.pop() {
        if expanded {
            sorted.push(tensor);
            continue;
        }
        if !visited.insert(tensor.node_id()) {
            continue;
        }
        stack.push((tensor.clone(), true));
        if let Some(grad_fn) = tensor.grad_fn() {
            for input in grad_fn.inputs() {
                if !visited.contains(&input.node_id()) {
                    stack.push((input, false));
                }
            }
        }
    }
    sorted
}

/// Elementwise sum of two same-shape gradients, outside of graph recording.
fn add_raw(a: &Tensor, b: &Tensor) -> Result<Tensor, FerrogradError> {
    let a_data = a.get_data();
    let b_data = b.get_data();
    if a_data.len() != b_data.len() {
        return Err(FerrogradError::InternalError(
            "gradient accumulation buffers disagree in length".to_string(),
        ));
    }
    let sum: Vec<f32> = a_data.iter().zip(b_data.iter()).map(|(x, y)| x + y).collect();
    Tensor::new(sum, a.shape())
}

/// Propagates `seed` from `root` to every leaf, visiting each node only after
/// all of its consumers have contributed, and accumulating into the gradient
/// buffer of every visited tensor that requires grad.
///
/// Accumulation is additive by design: repeating the call without a
/// `zero_grad()` in between sums the passes.
pub(crate) fn run_backward(root: &Tensor, seed: Tensor) -> Result<(), FerrogradError> {
    let sorted = topo_sort(root);
    let mut pending: HashMap<NodeId, Tensor> = HashMap::new();
    pending.insert(root.node_id(), seed);

    // Reverse topological order: a tensor is handled strictly after every
    // tensor downstream of it, so its pending gradient is complete here.
    for tensor in sorted.iter().rev() {
        let grad = match pending.remove(&tensor.node_id()) {
            Some(grad) => grad,
            None => continue,
        };

        if tensor.requires_grad() {
            tensor.acc_grad(grad.clone())?;
        }

        let grad_fn = match tensor.grad_fn() {
            Some(grad_fn) => grad_fn,
            None => continue,
        };

        let contributions = grad_fn.backward(&grad)?;
        let inputs = grad_fn.inputs();
        if contributions.len() != inputs.len() {
            return Err(FerrogradError::InternalError(format!(
                "backward rule produced {} gradients for {} inputs",
                contributions.len(),
                inputs.len()
            )));
        }

        for (input, contribution) in inputs.iter().zip(contributions) {
            if contribution.shape() != input.shape() {
                return Err(FerrogradError::ShapeMismatch {
                    expected: input.shape(),
                    actual: contribution.shape(),
                    operation: "backward (gradient contribution)".to_string(),
                });
            }
            match pending.entry(input.node_id()) {
                Entry::Occupied(mut entry) => {
                    let summed = add_raw(entry.get(), &contribution)?;
                    entry.insert(summed);
                }
                Entry::Vacant(entry) => {
                    entry.insert(contribution);
                }
            }
        }
    }
    Ok(())
}
