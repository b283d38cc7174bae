use std::{error::Error, fmt, io};

use optimization::OptimErr;

/// The trainer's result type.
pub type Result<T> = std::result::Result<T, TrainerErr>;

/// Trainer runtime failures.
#[derive(Debug)]
pub enum TrainerErr {
    Io(io::Error),
    Config(serde_json::Error),
    Optim(OptimErr),
}

impl fmt::Display for TrainerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainerErr::Io(e) => write!(f, "io error: {e}"),
            TrainerErr::Config(e) => write!(f, "invalid config: {e}"),
            TrainerErr::Optim(e) => write!(f, "optimizer error: {e}"),
        }
    }
}

impl Error for TrainerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainerErr::Io(e) => Some(e),
            TrainerErr::Config(e) => Some(e),
            TrainerErr::Optim(e) => Some(e),
        }
    }
}

impl From<io::Error> for TrainerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainerErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}

impl From<OptimErr> for TrainerErr {
    fn from(value: OptimErr) -> Self {
        Self::Optim(value)
    }
}

/// Boundary conversion for the binary's `main`.
impl From<TrainerErr> for io::Error {
    fn from(value: TrainerErr) -> Self {
        match value {
            TrainerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidInput, other),
        }
    }
}
