use log::debug;

use crate::error::FerrogradError;
use crate::nn::parameter::Parameter;
use crate::optim::optimizer::Optimizer;

/// Plain stochastic gradient descent: `p -= lr * p.grad` for every parameter.
///
/// Holds shared handles to the model's parameters; updates write through to
/// the same storage the layers read from.
#[derive(Debug)]
pub struct Sgd {
    params: Vec<Parameter>,
    learning_rate: f32,
}

impl Sgd {
    /// Rejects non-positive or non-finite learning rates.
    pub fn new(params: Vec<Parameter>, learning_rate: f32) -> Result<Self, FerrogradError> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(FerrogradError::InvalidLearningRate { lr: learning_rate });
        }
        Ok(Sgd {
            params,
            learning_rate,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Optimizer for Sgd {
    fn step(&mut self) -> Result<(), FerrogradError> {
        for param in &self.params {
            // Gradient storage is a separate tensor; copy its buffer out
            // before taking the parameter's write lock.
            let grad_data = match param.tensor().grad() {
                Some(grad) => grad.get_data(),
                None => {
                    debug!("Sgd::step: parameter {:?} has no gradient, skipping", param.shape());
                    continue;
                }
            };
            let mut guard = param.write_data();
            if grad_data.len() != guard.data.len() {
                return Err(FerrogradError::InternalError(format!(
                    "gradient has {} elements but parameter has {}",
                    grad_data.len(),
                    guard.data.len()
                )));
            }
            for (value, g) in guard.data.iter_mut().zip(grad_data.iter()) {
                *value -= self.learning_rate * g;
            }
        }
        Ok(())
    }

    fn zero_grad(&mut self) {
        for param in &self.params {
            param.tensor().zero_grad();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn rejects_bad_learning_rates() {
        assert!(matches!(
            Sgd::new(vec![], 0.0),
            Err(FerrogradError::InvalidLearningRate { .. })
        ));
        assert!(matches!(
            Sgd::new(vec![], -0.1),
            Err(FerrogradError::InvalidLearningRate { .. })
        ));
        assert!(matches!(
            Sgd::new(vec![], f32::NAN),
            Err(FerrogradError::InvalidLearningRate { .. })
        ));
        assert!(Sgd::new(vec![], 0.01).is_ok());
    }

    #[test]
    fn step_applies_lr_scaled_gradient() {
        let p = Parameter::new(Tensor::new(vec![1.0, 2.0], vec![2]).unwrap());
        p.acc_grad(Tensor::new(vec![0.5, -1.0], vec![2]).unwrap())
            .unwrap();
        let mut opt = Sgd::new(vec![p.clone()], 0.1).unwrap();
        opt.step().unwrap();
        assert_eq!(p.get_data(), vec![0.95, 2.1]);
    }

    #[test]
    fn step_skips_parameters_without_gradient() {
        let p = Parameter::new(Tensor::new(vec![3.0], vec![1]).unwrap());
        let mut opt = Sgd::new(vec![p.clone()], 0.1).unwrap();
        opt.step().unwrap();
        assert_eq!(p.get_data(), vec![3.0]);
    }

    #[test]
    fn zero_grad_clears_every_parameter() {
        let a = Parameter::new(Tensor::new(vec![1.0], vec![1]).unwrap());
        let b = Parameter::new(Tensor::new(vec![2.0], vec![1]).unwrap());
        a.acc_grad(Tensor::new(vec![1.0], vec![1]).unwrap()).unwrap();
        b.acc_grad(Tensor::new(vec![1.0], vec![1]).unwrap()).unwrap();
        let mut opt = Sgd::new(vec![a.clone(), b.clone()], 0.1).unwrap();
        opt.zero_grad();
        assert!(a.grad().is_none());
        assert!(b.grad().is_none());
    }

    #[test]
    fn gradients_accumulate_across_steps_without_zero_grad() {
        // Skipping zero_grad() between iterations compounds old gradients
        // into later updates. The second step below subtracts lr * 2.0, not
        // lr * 1.0, because the gradient buffer still holds the first pass.
        let p = Parameter::new(Tensor::new(vec![1.0], vec![1]).unwrap());
        let mut opt = Sgd::new(vec![p.clone()], 0.1).unwrap();

        p.acc_grad(Tensor::new(vec![1.0], vec![1]).unwrap()).unwrap();
        opt.step().unwrap();
        assert_eq!(p.get_data(), vec![0.9]);

        p.acc_grad(Tensor::new(vec![1.0], vec![1]).unwrap()).unwrap();
        opt.step().unwrap();
        assert!((p.get_data()[0] - 0.7).abs() < 1e-6);
    }
}
