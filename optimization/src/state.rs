use ndarray::{ArrayD, IxDyn, Zip};

use crate::AdamWConfig;

/// The AdamW state of a single parameter.
///
/// It's created the first time its parameter gets updated and lives for as long
/// as the parameter stays registered in the optimizer. The moments always have
/// the shape of the parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamState {
    first_moment: ArrayD<f32>,
    second_moment: ArrayD<f32>,
    step: u64,
}

impl ParamState {
    /// Creates a zeroed state for a parameter of the given shape.
    ///
    /// # Arguments
    /// * `shape` - The shape of the parameter this state belongs to.
    pub fn new(shape: &[usize]) -> Self {
        Self {
            first_moment: ArrayD::zeros(IxDyn(shape)),
            second_moment: ArrayD::zeros(IxDyn(shape)),
            step: 0,
        }
    }

    /// The exponential moving average of the (decayed) gradients.
    pub fn first_moment(&self) -> &ArrayD<f32> {
        &self.first_moment
    }

    /// The exponential moving average of the squared (decayed) gradients.
    pub fn second_moment(&self) -> &ArrayD<f32> {
        &self.second_moment
    }

    /// The amount of updates applied to the parameter so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Applies one AdamW update to `params` and advances this state.
    ///
    /// The shapes of `params` and `grad` must match the shape of the state.
    ///
    /// # Arguments
    /// * `config` - The hyperparameters of the parameter's group.
    /// * `params` - The values to update in place.
    /// * `grad` - The dense gradient of `params`.
    pub(crate) fn update(
        &mut self,
        config: &AdamWConfig,
        params: &mut ArrayD<f32>,
        grad: &ArrayD<f32>,
    ) {
        self.step += 1;

        let [b1, b2] = config.betas();
        let eps = config.epsilon();
        let wd = config.weight_decay();
        let step_size = config.step_size(self.step);

        Zip::from(params)
            .and(grad)
            .and(&mut self.first_moment)
            .and(&mut self.second_moment)
            .for_each(|p, &g, m, v| {
                let p0 = *p;
                let g = g + wd * p0;

                *m = b1 * *m + (1. - b1) * g;
                *v = b2 * *v + (1. - b2) * g * g;
                *p = p0 - step_size * *m / (v.sqrt() + eps) - step_size * wd * p0;
            });
    }
}
