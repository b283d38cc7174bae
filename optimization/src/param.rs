use std::{
    fmt::{self, Display},
    sync::Arc,
};

use ndarray::{ArrayD, ArrayViewMutD};
use parking_lot::{Mutex, MutexGuard};

/// Stable identifier of a parameter inside an optimizer.
///
/// Ids are handed out in registration order, starting at 0 and counting
/// across every parameter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId(pub usize);

impl Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A gradient attached to a parameter by the host's differentiation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    Dense(ArrayD<f32>),
    /// Coordinate-list representation, `indices[i]` holds the multi-index of `values[i]`.
    Sparse {
        shape: Vec<usize>,
        indices: Vec<Vec<usize>>,
        values: Vec<f32>,
    },
}

impl Gradient {
    /// Returns `true` if the gradient is in sparse representation.
    pub fn is_sparse(&self) -> bool {
        matches!(self, Gradient::Sparse { .. })
    }

    /// Returns the logical shape of the gradient.
    pub fn shape(&self) -> &[usize] {
        match self {
            Gradient::Dense(grad) => grad.shape(),
            Gradient::Sparse { shape, .. } => shape,
        }
    }
}

impl From<ArrayD<f32>> for Gradient {
    fn from(value: ArrayD<f32>) -> Self {
        Self::Dense(value)
    }
}

/// The data guarded by a `Parameter` handle.
#[derive(Debug)]
pub struct ParamData {
    value: ArrayD<f32>,
    grad: Option<Gradient>,
}

impl ParamData {
    /// The current parameter values.
    pub fn value(&self) -> &ArrayD<f32> {
        &self.value
    }

    /// A mutable view of the values, their shape can't be changed through it.
    pub fn value_mut(&mut self) -> ArrayViewMutD<'_, f32> {
        self.value.view_mut()
    }

    /// The gradient attached to this parameter, if any.
    pub fn grad(&self) -> Option<&Gradient> {
        self.grad.as_ref()
    }

    pub fn set_grad(&mut self, grad: Gradient) {
        self.grad = Some(grad);
    }

    /// Detaches and returns the current gradient.
    pub fn take_grad(&mut self) -> Option<Gradient> {
        self.grad.take()
    }

    /// Splits the borrow so the values can be mutated while reading the gradient.
    pub(crate) fn split_mut(&mut self) -> (&mut ArrayD<f32>, Option<&Gradient>) {
        (&mut self.value, self.grad.as_ref())
    }
}

/// A shared handle to a trainable tensor.
///
/// Cloning the handle doesn't copy the tensor, every clone refers to the
/// same storage. The host keeps one clone to compute gradients and the
/// optimizer keeps another to apply the updates.
#[derive(Debug, Clone)]
pub struct Parameter {
    inner: Arc<Mutex<ParamData>>,
}

impl Parameter {
    /// Creates a new `Parameter` without gradient.
    ///
    /// # Arguments
    /// * `value` - The initial values of the parameter.
    pub fn new(value: ArrayD<f32>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ParamData { value, grad: None })),
        }
    }

    /// Locks the parameter for reading or writing.
    ///
    /// # Returns
    /// A guard to the parameter data, the lock is released when it's dropped.
    pub fn lock(&self) -> MutexGuard<'_, ParamData> {
        self.inner.lock()
    }

    /// Returns a copy of the current values.
    pub fn value(&self) -> ArrayD<f32> {
        self.lock().value.clone()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.lock().value.shape().to_vec()
    }

    pub fn set_grad(&self, grad: impl Into<Gradient>) {
        self.lock().set_grad(grad.into());
    }

    pub fn clear_grad(&self) {
        self.lock().grad = None;
    }

    pub fn has_grad(&self) -> bool {
        self.lock().grad.is_some()
    }

    /// Returns `true` if both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Parameter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<ArrayD<f32>> for Parameter {
    fn from(value: ArrayD<f32>) -> Self {
        Self::new(value)
    }
}
