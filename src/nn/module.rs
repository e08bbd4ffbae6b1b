use crate::error::FerrogradError;
use crate::nn::parameter::Parameter;
use crate::tensor::Tensor;

/// The single capability layers are polymorphic over: map a tensor to a
/// tensor, building the computation graph as a side effect, and expose any
/// learnable parameters.
///
/// The layer set is closed (see [`crate::nn::layers::Layer`]); this trait
/// exists so the enum variants and the [`crate::model::Sequential`] container
/// share one forward/parameters signature rather than to support plugins.
pub trait Module: std::fmt::Debug {
    /// Applies the module to `input`, recording graph nodes when gradients
    /// are tracked.
    fn forward(&self, input: &Tensor) -> Result<Tensor, FerrogradError>;

    /// Learnable parameters of this module, in deterministic order. Returned
    /// handles share storage with the module's own, so the optimizer mutates
    /// the same buffers the forward pass reads.
    fn parameters(&self) -> Vec<Parameter>;
}
