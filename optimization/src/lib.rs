mod adamw;
mod config;
mod error;
mod optimizer;
mod param;
mod state;

pub use adamw::{AdamW, ParamGroup};
pub use config::{AdamWConfig, AdamWSpec};
pub use error::{ErrorKind, OptimErr, Result};
pub use optimizer::Optimizer;
pub use param::{Gradient, ParamData, ParamId, Parameter};
pub use state::ParamState;
