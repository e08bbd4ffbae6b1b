use log::{debug, info};

use crate::error::FerrogradError;
use crate::model::Sequential;
use crate::nn::module::Module;
use crate::ops::loss::nll_loss_op;
use crate::optim::{Optimizer, Sgd};
use crate::tensor::Tensor;

/// Hyperparameters for [`fit`].
///
/// `layer_widths` lists the output width of every `Linear` layer in order;
/// the last entry is the class count.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub learning_rate: f32,
    pub epochs: usize,
    pub layer_widths: Vec<usize>,
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), FerrogradError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(FerrogradError::InvalidLearningRate {
                lr: self.learning_rate,
            });
        }
        if self.layer_widths.is_empty() || self.layer_widths.contains(&0) {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![1],
                actual: self.layer_widths.clone(),
                operation: "TrainConfig (layer widths must be positive and non-empty)".to_string(),
            });
        }
        Ok(())
    }
}

/// One minibatch of labelled examples: inputs `[n, d]` and one class index
/// per row.
#[derive(Debug, Clone)]
pub struct Batch {
    inputs: Tensor,
    targets: Vec<usize>,
}

impl Batch {
    pub fn new(inputs: Tensor, targets: Vec<usize>) -> Result<Self, FerrogradError> {
        let shape = inputs.shape();
        if shape.len() != 2 {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![targets.len(), 0],
                actual: shape,
                operation: "Batch::new (inputs must be [batch, features])".to_string(),
            });
        }
        if shape[0] != targets.len() {
            return Err(FerrogradError::ShapeMismatch {
                expected: vec![targets.len(), shape[1]],
                actual: shape,
                operation: "Batch::new (one target per input row)".to_string(),
            });
        }
        Ok(Batch { inputs, targets })
    }

    pub fn inputs(&self) -> &Tensor {
        &self.inputs
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Runs one pass over `batches`: for each, clears gradients, computes the NLL
/// loss of the model's log-probabilities, backpropagates, and applies an SGD
/// step. Returns the mean loss over the batches.
pub fn train_epoch(
    model: &Sequential,
    optimizer: &mut Sgd,
    batches: &[Batch],
) -> Result<f32, FerrogradError> {
    if batches.is_empty() {
        return Err(FerrogradError::InternalError(
            "train_epoch called with no batches".to_string(),
        ));
    }
    let mut total_loss = 0.0f32;
    for (i, batch) in batches.iter().enumerate() {
        optimizer.zero_grad();
        let log_probs = model.forward(batch.inputs())?;
        let loss = nll_loss_op(&log_probs, batch.targets())?;
        let loss_value = loss.item()?;
        loss.backward(None)?;
        optimizer.step()?;
        debug!("batch {}: loss = {:.6}", i, loss_value);
        total_loss += loss_value;
    }
    Ok(total_loss / batches.len() as f32)
}

/// Trains a fresh SGD optimizer over the model's parameters for
/// `config.epochs` passes and returns the mean loss of each epoch.
pub fn fit(
    model: &Sequential,
    config: &TrainConfig,
    batches: &[Batch],
) -> Result<Vec<f32>, FerrogradError> {
    config.validate()?;
    let mut optimizer = Sgd::new(model.parameters(), config.learning_rate)?;
    debug!(
        "fit: {} epochs at learning rate {}",
        config.epochs,
        optimizer.learning_rate()
    );
    let mut losses = Vec::with_capacity(config.epochs);
    for epoch in 0..config.epochs {
        let loss = train_epoch(model, &mut optimizer, batches)?;
        info!("epoch {}/{}: mean loss = {:.6}", epoch + 1, config.epochs, loss);
        losses.push(loss);
    }
    Ok(losses)
}

/// Runs the model and exponentiates its log-probabilities, returning `[n, c]`
/// class probabilities.
pub fn predict_proba(model: &Sequential, inputs: &Tensor) -> Result<Tensor, FerrogradError> {
    let log_probs = model.forward(inputs)?;
    let probs: Vec<f32> = log_probs.get_data().iter().map(|v| v.exp()).collect();
    Tensor::new(probs, log_probs.shape())
}
