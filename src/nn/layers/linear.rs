use rand::Rng;

use crate::error::FerrogradError;
use crate::nn::init::scaled_uniform;
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;
use crate::ops::linalg::linear_op;
use crate::tensor::{zeros, Tensor};

/// Affine layer `y = x·Wᵗ + b`.
///
/// Owns its weight (`[out_features, in_features]`) and bias (`[out_features]`)
/// parameters; both are mutated in place by the optimizer and never replaced.
#[derive(Debug)]
pub struct Linear {
    weight: Parameter,
    bias: Parameter,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// Creates a layer with weight drawn uniformly in `±1/sqrt(in_features)`
    /// and zero bias.
    pub fn new<R: Rng>(
        in_features: usize,
        out_features: usize,
        rng: &mut R,
    ) -> Result<Self, FerrogradError> {
        let weight = Parameter::new(scaled_uniform(out_features, in_features, rng)?);
        let bias = Parameter::new(zeros(vec![out_features])?);
        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    /// Builds a layer from existing weight and bias tensors, validating their
    /// shapes. Used by tests and by callers that need exact parameter values.
    pub fn from_parts(weight: Tensor, bias: Tensor) -> Result<Self, FerrogradError> {
        let weight_shape = weight.shape();
        if weight_shape.len() != 2 {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![0, 0],
                actual: weight_shape,
                operation: "Linear::from_parts (weight must be [out, in])".to_string(),
            });
        }
        let out_features = weight_shape[0];
        let in_features = weight_shape[1];
        if bias.shape() != vec![out_features] {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![out_features],
                actual: bias.shape(),
                operation: "Linear::from_parts (bias must match weight rows)".to_string(),
            });
        }
        Ok(Linear {
            weight: Parameter::new(weight),
            bias: Parameter::new(bias),
            in_features,
            out_features,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }

    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    pub fn bias(&self) -> &Parameter {
        &self.bias
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError> {
        linear_op(input, &self.weight, &self.bias)
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![self.weight.clone(), self.bias.clone()]
    }
}
