use rand::Rng;

use crate::error::FerrogradError;
use crate::nn::layers::{Layer, Linear, LogSoftmax, ReLU};
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;
use crate::tensor::Tensor;

/// An ordered stack of layers; the output of each is the input of the next.
///
/// Threading a batch through the stack builds the operation graph end to end;
/// a later `backward()` on the loss walks back through every layer's recorded
/// nodes.
#[derive(Debug, Default)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential { layers: Vec::new() }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Builds the standard classifier stack from the configuration surface:
    /// a `Linear` per entry of `layer_widths` (the last width being the class
    /// count), `ReLU` between them, and a final `LogSoftmax` so the network
    /// outputs log-probabilities ready for the NLL loss.
    pub fn mlp<R: Rng>(
        feature_dim: usize,
        layer_widths: &[usize],
        rng: &mut R,
    ) -> Result<Self, FerrogradError> {
        if layer_widths.is_empty() || layer_widths.contains(&0) || feature_dim == 0 {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![1],
                actual: layer_widths.to_vec(),
                operation: "Sequential::mlp (widths must be positive and non-empty)".to_string(),
            });
        }
        let mut model = Sequential::new();
        let mut in_features = feature_dim;
        for (i, &width) in layer_widths.iter().enumerate() {
            model.push(Layer::Linear(Linear::new(in_features, width, rng)?));
            if i + 1 < layer_widths.len() {
                model.push(Layer::ReLU(ReLU::new()));
            }
            in_features = width;
        }
        model.push(Layer::LogSoftmax(LogSoftmax::new()));
        Ok(model)
    }
}

impl Module for Sequential {
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Flattened parameters of all layers, in layer order. Deterministic so
    /// the optimizer sees a stable set.
    fn parameters(&self) -> Vec<Parameter> {
        let mut params = Vec::new();
        for layer in &self.layers {
            params.extend(layer.parameters());
        }
        params
    }
}
