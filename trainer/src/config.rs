use std::{fs, num::NonZeroUsize, path::Path};

use optimization::AdamWSpec;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const EPOCHS: NonZeroUsize = NonZeroUsize::new(500).unwrap();
const SAMPLES: NonZeroUsize = NonZeroUsize::new(64).unwrap();
const LOG_EVERY: NonZeroUsize = NonZeroUsize::new(50).unwrap();

/// The trainer's configuration, every field falls back to its default when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TrainerConfig {
    pub epochs: NonZeroUsize,
    pub samples: NonZeroUsize,
    pub slope: f32,
    pub intercept: f32,
    pub log_every: NonZeroUsize,
    pub optimizer: AdamWSpec,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: EPOCHS,
            samples: SAMPLES,
            slope: 3.0,
            intercept: -2.0,
            log_every: LOG_EVERY,
            optimizer: AdamWSpec {
                learning_rate: 0.05,
                ..AdamWSpec::default()
            },
        }
    }
}

impl TrainerConfig {
    /// Reads a JSON configuration file.
    ///
    /// # Args
    /// * `path` - The location of the file.
    ///
    /// # Returns
    /// The parsed config, or an error if the file can't be read or isn't valid JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrainerErr;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = TrainerConfig::from_json("{}").unwrap();
        assert_eq!(config.epochs.get(), 500);
        assert_eq!(config.samples.get(), 64);
        assert_eq!(config.optimizer.learning_rate, 0.05);
        assert_eq!(config.optimizer.betas, [0.9, 0.999]);
    }

    #[test]
    fn test_nested_optimizer_spec() {
        let raw = r#"{
            "epochs": 10,
            "slope": -1.5,
            "optimizer": { "learning_rate": 0.1, "weight_decay": 0.01, "correct_bias": false }
        }"#;

        let config = TrainerConfig::from_json(raw).unwrap();
        assert_eq!(config.epochs.get(), 10);
        assert_eq!(config.slope, -1.5);
        assert_eq!(config.optimizer.weight_decay, 0.01);
        assert!(!config.optimizer.correct_bias);
        assert_eq!(config.optimizer.epsilon, 1e-6);
    }

    #[test]
    fn test_rejects_zero_epochs() {
        let err = TrainerConfig::from_json(r#"{ "epochs": 0 }"#).unwrap_err();
        assert!(matches!(err, TrainerErr::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TrainerConfig::from_path("/definitely/not/a/config.json").unwrap_err();
        assert!(matches!(err, TrainerErr::Io(_)));
    }
}
