use std::{
    error::Error,
    fmt::{self, Display},
};

use crate::ParamId;

/// The result type used in the entire optimization module.
pub type Result<T> = std::result::Result<T, OptimErr>;

/// The broad category an `OptimErr` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller handed in a malformed hyperparameter, parameter list or gradient.
    InvalidArgument,
    /// The operation is not supported by the AdamW update rule.
    Unsupported,
}

/// The optimization module's error type.
#[derive(Debug)]
pub enum OptimErr {
    InvalidLearningRate {
        value: f32,
    },
    InvalidBeta {
        index: usize,
        value: f32,
    },
    InvalidEpsilon {
        value: f32,
    },
    EmptyParamList,
    DuplicateParam {
        id: ParamId,
    },
    ShapeMismatch {
        id: ParamId,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    SparseGradient {
        id: ParamId,
    },
}

impl OptimErr {
    /// Returns the category of this error.
    ///
    /// # Returns
    /// `ErrorKind::Unsupported` for sparse gradients, `ErrorKind::InvalidArgument` otherwise.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OptimErr::SparseGradient { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

impl Display for OptimErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimErr::InvalidLearningRate { value } => {
                write!(f, "invalid learning rate: {value} - should be >= 0.0")
            }
            OptimErr::InvalidBeta { index, value } => write!(
                f,
                "invalid beta{} parameter: {value} - should be in [0.0, 1.0)",
                index + 1
            ),
            OptimErr::InvalidEpsilon { value } => {
                write!(f, "invalid epsilon value: {value} - should be >= 0.0")
            }
            OptimErr::EmptyParamList => f.write_str("optimizer got an empty parameter list"),
            OptimErr::DuplicateParam { id } => write!(
                f,
                "parameter {id} is already registered in the optimizer, parameters can't be registered twice"
            ),
            OptimErr::ShapeMismatch { id, got, expected } => write!(
                f,
                "shape mismatch for parameter {id}: got {got:?}, expected {expected:?}"
            ),
            OptimErr::SparseGradient { id } => write!(
                f,
                "AdamW does not support sparse gradients (parameter {id})"
            ),
        }
    }
}

impl Error for OptimErr {}
