use crate::Result;

/// Defines the strategy for updating parameters based on the gradients attached to them.
///
/// The `Optimizer` trait is responsible for the mathematical transition of parameters from state `t` to `t+1`.
pub trait Optimizer {
    /// Updates every registered parameter that has a gradient.
    ///
    /// # Returns
    /// An error if any of the gradients can't be applied, parameters updated before
    /// the failing one keep their new values.
    fn step(&mut self) -> Result<()>;

    /// Detaches the gradient of every registered parameter.
    fn zero_grad(&self);
}
