use crate::error::FerrogradError;
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;
use crate::ops::activation::relu_op;
use crate::tensor::Tensor;

/// Stateless elementwise ReLU.
#[derive(Debug, Default)]
pub struct ReLU;

impl ReLU {
    pub fn new() -> Self {
        ReLU
    }
}

impl Module for ReLU {
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError> {
        relu_op(input)
    }

    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }
}
