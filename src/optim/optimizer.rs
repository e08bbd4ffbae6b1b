use crate::error::FerrogradError;

/// Common interface for parameter update rules.
pub trait Optimizer {
    /// Applies one update to every managed parameter using its current
    /// gradient. Parameters without a gradient are skipped.
    fn step(&mut self) -> Result<(), FerrogradError>;

    /// Drops the gradient buffer of every managed parameter. Call this before
    /// each backward pass; gradients otherwise accumulate across iterations.
    fn zero_grad(&mut self);
}
