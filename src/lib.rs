//! Reverse-mode automatic differentiation over small dense f32 tensors, plus
//! the neural-network pieces needed to train a feed-forward classifier:
//! layers, negative log-likelihood loss, SGD, and a minimal training loop.
//!
//! The forward pass of every differentiable operation records a graph node
//! ([`autograd::BackwardOp`]) on its output tensor; calling
//! [`Tensor::backward`] on a loss walks that graph in reverse topological
//! order and accumulates gradients into every tracked tensor.
//!
//! ```no_run
//! use ferrograd::model::Sequential;
//! use ferrograd::train::{fit, Batch, TrainConfig};
//! use ferrograd::Tensor;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> Result<(), ferrograd::FerrogradError> {
//! let mut rng = StdRng::seed_from_u64(42);
//! let config = TrainConfig { learning_rate: 0.1, epochs: 10, layer_widths: vec![8, 2] };
//! let model = Sequential::mlp(2, &config.layer_widths, &mut rng)?;
//! let batch = Batch::new(Tensor::new(vec![0.0, 1.0, 1.0, 0.0], vec![2, 2])?, vec![1, 0])?;
//! let losses = fit(&model, &config, &[batch])?;
//! println!("final loss: {}", losses[losses.len() - 1]);
//! # Ok(())
//! # }
//! ```

pub mod autograd;
pub mod error;
pub mod model;
pub mod nn;
pub mod ops;
pub mod optim;
pub mod tensor;
pub mod tensor_data;
pub mod train;

pub use error::FerrogradError;
pub use tensor::Tensor;
