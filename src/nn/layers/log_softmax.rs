use crate::error::FerrogradError;
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;
use crate::ops::activation::log_softmax_op;
use crate::tensor::Tensor;

/// Stateless log-softmax along the class (last) axis.
#[derive(Debug, Default)]
pub struct LogSoftmax;

impl LogSoftmax {
    pub fn new() -> Self {
        LogSoftmax
    }
}

impl Module for LogSoftmax {
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError> {
        log_softmax_op(input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }
}
