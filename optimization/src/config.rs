use serde::{Deserialize, Serialize};

use crate::{OptimErr, Result};

/// The specification for an `AdamWConfig`, as it's read from configuration files.
///
/// Every field is optional when deserializing, missing ones take the default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AdamWSpec {
    pub learning_rate: f32,
    pub betas: [f32; 2],
    pub epsilon: f32,
    pub weight_decay: f32,
    pub correct_bias: bool,
}

impl Default for AdamWSpec {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            betas: [0.9, 0.999],
            epsilon: 1e-6,
            weight_decay: 0.0,
            correct_bias: true,
        }
    }
}

/// The validated hyperparameters of an AdamW parameter group.
///
/// Once built it can't be modified, every parameter of the group reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamWConfig {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    correct_bias: bool,
}

impl AdamWConfig {
    /// Creates a new `AdamWConfig`.
    ///
    /// # Arguments
    /// * `learning_rate` - The base step size, must be `>= 0`.
    /// * `betas` - The decay rates of the first and second moments, both in `[0, 1)`.
    /// * `epsilon` - Denominator guard, must be `>= 0`.
    /// * `weight_decay` - The weight decay coefficient.
    /// * `correct_bias` - Carried for config compatibility, the step size is always bias corrected.
    ///
    /// # Returns
    /// The validated config, or an `OptimErr` naming the first offending hyperparameter.
    pub fn new(
        learning_rate: f32,
        betas: [f32; 2],
        epsilon: f32,
        weight_decay: f32,
        correct_bias: bool,
    ) -> Result<Self> {
        // Negated comparisons so NaN is rejected too.
        if !(learning_rate >= 0.) {
            return Err(OptimErr::InvalidLearningRate {
                value: learning_rate,
            });
        }

        for (index, value) in betas.into_iter().enumerate() {
            if !(0.0..1.0).contains(&value) {
                return Err(OptimErr::InvalidBeta { index, value });
            }
        }

        if !(epsilon >= 0.) {
            return Err(OptimErr::InvalidEpsilon { value: epsilon });
        }

        let [beta1, beta2] = betas;

        Ok(Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            weight_decay,
            correct_bias,
        })
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn betas(&self) -> [f32; 2] {
        [self.beta1, self.beta2]
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }

    pub fn correct_bias(&self) -> bool {
        self.correct_bias
    }

    /// Computes the step size for the `t`-th update of a parameter.
    ///
    /// This is `lr * sqrt(1 - beta2^t) / (1 - beta1^t)` regardless of
    /// `correct_bias`, the scalar factors are evaluated in double precision.
    ///
    /// # Arguments
    /// * `t` - The step count of the parameter, starting at 1.
    pub fn step_size(&self, t: u64) -> f32 {
        let lr = self.learning_rate as f64;
        let t = t as f64;
        let bc1 = 1. - (self.beta1 as f64).powf(t);
        let bc2 = 1. - (self.beta2 as f64).powf(t);

        (lr * bc2.sqrt() / bc1) as f32
    }
}

impl Default for AdamWConfig {
    fn default() -> Self {
        let AdamWSpec {
            learning_rate,
            betas: [beta1, beta2],
            epsilon,
            weight_decay,
            correct_bias,
        } = AdamWSpec::default();

        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            weight_decay,
            correct_bias,
        }
    }
}

impl TryFrom<AdamWSpec> for AdamWConfig {
    type Error = OptimErr;

    fn try_from(spec: AdamWSpec) -> Result<Self> {
        Self::new(
            spec.learning_rate,
            spec.betas,
            spec.epsilon,
            spec.weight_decay,
            spec.correct_bias,
        )
    }
}

impl From<AdamWConfig> for AdamWSpec {
    fn from(config: AdamWConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            betas: config.betas(),
            epsilon: config.epsilon,
            weight_decay: config.weight_decay,
            correct_bias: config.correct_bias,
        }
    }
}
