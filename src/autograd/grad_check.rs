//! Finite-difference gradient checking.
//!
//! The primary correctness law of the autodiff engine: for every operation,
//! the analytical gradient produced by its backward rule must match a centered
//! finite-difference estimate of `d(sum(output * output_grad)) / d(input)`.

use approx::relative_eq;
use thiserror::Error;

use crate::error::FerrogradError;
use crate::tensor::Tensor;

/// Failures specific to gradient checking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient mismatch for input {input_index}, element {element_index}: analytical {analytical} != numerical {numerical} (difference {difference})")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },

    #[error("Forward function failed during gradient check: {0}")]
    ForwardPassError(FerrogradError),

    #[error("Backward pass failed during gradient check: {0}")]
    BackwardPassError(FerrogradError),

    #[error("Input {input_index} requires grad but has no gradient after backward")]
    MissingAnalyticalGrad { input_index: usize },

    #[error("Numerical gradient is not finite for input {input_index}, element {element_index} (loss+: {loss_plus}, loss-: {loss_minus})")]
    NonFiniteNumericalGrad {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Analytical gradient is not finite for input {input_index}, element {element_index}: {value}")]
    NonFiniteAnalyticalGrad {
        input_index: usize,
        element_index: usize,
        value: f64,
    },

    #[error("Function did not propagate requires_grad to its output")]
    RequiresGradPropagationError,

    #[error("Tensor error during gradient check: {0}")]
    TensorError(#[from] FerrogradError),
}

/// Scalar probe used for the numerical side: `sum(output * output_grad)`.
/// Its derivative w.r.t. any input element is exactly the analytical gradient
/// seeded with `output_grad`.
fn weighted_sum(output: &Tensor, output_grad: &Tensor) -> Result<f64, GradCheckError> {
    if output.shape() != output_grad.shape() {
        return Err(GradCheckError::TensorError(FerrogradError::ShapeMismatch {
            expected: output.shape(),
            actual: output_grad.shape(),
            operation: "grad_check weighted_sum".to_string(),
        }));
    }
    Ok(output
        .get_data()
        .iter()
        .zip(output_grad.get_data().iter())
        .map(|(o, g)| *o as f64 * *g as f64)
        .sum())
}

/// Checks the analytical gradients of `func` against centered finite
/// differences for every tracked input.
///
/// `epsilon` is the perturbation step; `tolerance` is accepted both as an
/// absolute and as a relative bound (f32 forward passes limit how tight the
/// numerical estimate can be).
pub fn check_grad<F>(
    func: F,
    inputs: &[Tensor],
    output_grad: &Tensor,
    epsilon: f32,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&[Tensor]) -> Result<Tensor, FerrogradError>,
{
    // Analytical pass.
    for input in inputs {
        input.zero_grad();
    }
    let output = func(inputs).map_err(GradCheckError::ForwardPassError)?;
    if inputs.iter().any(|t| t.requires_grad()) && !output.requires_grad() {
        return Err(GradCheckError::RequiresGradPropagationError);
    }
    output
        .backward(Some(output_grad.clone()))
        .map_err(GradCheckError::BackwardPassError)?;

    for (i, input) in inputs.iter().enumerate() {
        if !input.requires_grad() {
            continue;
        }
        let analytical_grad = input
            .grad()
            .ok_or(GradCheckError::MissingAnalyticalGrad { input_index: i })?;
        let analytical_data = analytical_grad.get_data();
        let original_data = input.get_data();

        for elem_idx in 0..original_data.len() {
            let loss_at = |delta: f32| -> Result<f64, GradCheckError> {
                let mut perturbed_data = original_data.clone();
                perturbed_data[elem_idx] += delta;
                let perturbed = Tensor::new(perturbed_data, input.shape())?;
                let mut probe_inputs: Vec<Tensor> = inputs.to_vec();
                probe_inputs[i] = perturbed;
                let probe_output =
                    func(&probe_inputs).map_err(GradCheckError::ForwardPassError)?;
                weighted_sum(&probe_output, output_grad)
            };

            let loss_plus = loss_at(epsilon)?;
            let loss_minus = loss_at(-epsilon)?;
            let numerical = (loss_plus - loss_minus) / (2.0 * epsilon as f64);
            let analytical = analytical_data[elem_idx] as f64;

            if !numerical.is_finite() {
                return Err(GradCheckError::NonFiniteNumericalGrad {
                    input_index: i,
                    element_index: elem_idx,
                    loss_plus,
                    loss_minus,
                });
            }
            if !analytical.is_finite() {
                return Err(GradCheckError::NonFiniteAnalyticalGrad {
                    input_index: i,
                    element_index: elem_idx,
                    value: analytical,
                });
            }

            if !relative_eq!(
                analytical,
                numerical,
                epsilon = tolerance,
                max_relative = tolerance
            ) {
                return Err(GradCheckError::GradientMismatch {
                    input_index: i,
                    element_index: elem_idx,
                    analytical,
                    numerical,
                    difference: (analytical - numerical).abs(),
                });
            }
        }
    }
    Ok(())
}
