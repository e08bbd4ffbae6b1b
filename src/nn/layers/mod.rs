//! The closed set of layer types.
//!
//! The supported layers are small and fixed, so they form a tagged sum type
//! rather than boxed trait objects; `Layer` itself implements [`Module`] by
//! delegation, which is what `Sequential` composes.

pub mod linear;
pub mod log_softmax;
pub mod relu;

pub use linear::Linear;
pub use log_softmax::LogSoftmax;
pub use relu::ReLU;

use crate::error::FerrogradError;
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;
use crate::tensor::Tensor;

/// A feed-forward layer: parameterized affine map or stateless activation.
#[derive(Debug)]
pub enum Layer {
    Linear(Linear),
    ReLU(ReLU),
    LogSoftmax(LogSoftmax),
}

impl Module for Layer {
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError> {
        match self {
            Layer::Linear(layer) => layer.forward(input),
            Layer::ReLU(layer) => layer.forward(input),
            Layer::LogSoftmax(layer) => layer.forward(input),
        }
    }

    fn parameters(&self) -> Vec<Parameter> {
        match self {
            Layer::Linear(layer) => layer.parameters(),
            Layer::ReLU(layer) => layer.parameters(),
            Layer::LogSoftmax(layer) => layer.parameters(),
        }
    }
}
