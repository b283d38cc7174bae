use log::{debug, trace};
use ndarray::ArrayD;
use rayon::prelude::*;

use crate::{
    AdamWConfig, Gradient, OptimErr, Optimizer, ParamData, ParamId, ParamState, Parameter, Result,
};

/// A registered parameter together with its lazily created state.
#[derive(Debug)]
struct ParamSlot {
    id: ParamId,
    param: Parameter,
    state: Option<ParamState>,
}

/// A set of parameters sharing the same hyperparameters.
#[derive(Debug)]
pub struct ParamGroup {
    config: AdamWConfig,
    slots: Vec<ParamSlot>,
}

impl ParamGroup {
    pub fn config(&self) -> &AdamWConfig {
        &self.config
    }

    /// Returns the ids of the parameters in this group, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ParamId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The AdamW optimization algorithm.
///
/// Every step folds the weight decay term into the gradient before tracking
/// the moments, and then applies it once more, decoupled, after the
/// bias-corrected gradient step. Both terms are scaled by the same step size.
#[derive(Debug)]
pub struct AdamW {
    groups: Vec<ParamGroup>,
    next_id: usize,
}

impl AdamW {
    /// Creates a new `AdamW` optimizer with a single parameter group.
    ///
    /// # Arguments
    /// * `params` - The handles of the parameters to optimize.
    /// * `config` - The hyperparameters for all of them.
    ///
    /// # Returns
    /// A new `AdamW` instance, or an error if `params` is empty or holds the same parameter twice.
    pub fn new<I>(params: I, config: AdamWConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Parameter>,
    {
        let mut adamw = Self {
            groups: Vec::new(),
            next_id: 0,
        };

        adamw.add_param_group(params, config)?;
        Ok(adamw)
    }

    /// Registers a new group of parameters with its own hyperparameters.
    ///
    /// Nothing is registered if an error is returned.
    ///
    /// # Arguments
    /// * `params` - The handles of the parameters to optimize.
    /// * `config` - The hyperparameters for the group.
    ///
    /// # Returns
    /// The ids assigned to `params`, in the same order.
    pub fn add_param_group<I>(&mut self, params: I, config: AdamWConfig) -> Result<Vec<ParamId>>
    where
        I: IntoIterator<Item = Parameter>,
    {
        let params: Vec<_> = params.into_iter().collect();
        if params.is_empty() {
            return Err(OptimErr::EmptyParamList);
        }

        let mut slots: Vec<ParamSlot> = Vec::with_capacity(params.len());

        for (i, param) in params.into_iter().enumerate() {
            let id = ParamId(self.next_id + i);
            let registered = self.slots().chain(&slots).any(|slot| slot.param.ptr_eq(&param));
            if registered {
                return Err(OptimErr::DuplicateParam { id });
            }

            slots.push(ParamSlot {
                id,
                param,
                state: None,
            });
        }

        self.next_id += slots.len();
        let ids = slots.iter().map(|slot| slot.id).collect();

        debug!(
            group = self.groups.len(),
            params = slots.len(),
            lr = config.learning_rate(),
            weight_decay = config.weight_decay();
            "registered adamw parameter group"
        );

        self.groups.push(ParamGroup { config, slots });
        Ok(ids)
    }

    /// Updates every parameter with a gradient, in registration order.
    ///
    /// Stops at the first parameter whose gradient is sparse or doesn't match
    /// its shape, the ones processed before it keep their updates.
    pub fn step(&mut self) -> Result<()> {
        trace!(params = self.len(); "adamw step");

        for group in &mut self.groups {
            let config = &group.config;
            for slot in &mut group.slots {
                let mut data = slot.param.lock();
                update_param(config, slot.id, &mut slot.state, &mut data)?;
            }
        }

        Ok(())
    }

    /// Runs `closure` once and then performs a `step`.
    ///
    /// The closure is called before any parameter is locked, so it's free to
    /// recompute the loss and attach new gradients.
    ///
    /// # Arguments
    /// * `closure` - Usually reevaluates the model and returns the loss.
    ///
    /// # Returns
    /// The value returned by `closure`, or the error of the step.
    pub fn step_with<L, F>(&mut self, closure: F) -> Result<L>
    where
        F: FnOnce() -> L,
    {
        let loss = closure();
        self.step()?;
        Ok(loss)
    }

    /// Updates every parameter with a gradient in parallel.
    ///
    /// Every parameter is locked, in registration order, for the whole call.
    /// All gradients are checked while holding the locks, so unlike `step`
    /// nothing gets updated if one of them is rejected.
    pub fn par_step(&mut self) -> Result<()> {
        trace!(params = self.len(); "adamw parallel step");

        let params: Vec<Parameter> = self.slots().map(|slot| slot.param.clone()).collect();
        let mut guards: Vec<_> = params.iter().map(Parameter::lock).collect();

        for (slot, data) in self.slots().zip(&guards) {
            check_grad(slot.id, data.value(), data.grad(), slot.state.as_ref())?;
        }

        let mut targets = Vec::with_capacity(guards.len());
        for group in &mut self.groups {
            let config = &group.config;
            targets.extend(
                group
                    .slots
                    .iter_mut()
                    .map(|slot| (config, slot.id, &mut slot.state)),
            );
        }

        let data: Vec<&mut ParamData> = guards.iter_mut().map(|guard| &mut **guard).collect();

        data.into_par_iter()
            .zip(targets)
            .try_for_each(|(data, (config, id, state))| update_param(config, id, state, data))
    }

    /// Clears the gradients of all the registered parameters.
    pub fn zero_grad(&self) {
        self.slots().for_each(|slot| slot.param.clear_grad());
    }

    /// Returns the state of a parameter.
    ///
    /// # Returns
    /// `None` if there's no such parameter or it hasn't been updated yet.
    pub fn state(&self, id: ParamId) -> Option<&ParamState> {
        self.slot(id)?.state.as_ref()
    }

    /// Returns the handle of a registered parameter.
    pub fn param(&self, id: ParamId) -> Option<&Parameter> {
        self.slot(id).map(|slot| &slot.param)
    }

    pub fn param_groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// The total amount of registered parameters.
    pub fn len(&self) -> usize {
        self.next_id
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    fn slots(&self) -> impl Iterator<Item = &ParamSlot> {
        self.groups.iter().flat_map(|group| &group.slots)
    }

    fn slot(&self, id: ParamId) -> Option<&ParamSlot> {
        self.slots().find(|slot| slot.id == id)
    }
}

impl Optimizer for AdamW {
    fn step(&mut self) -> Result<()> {
        AdamW::step(self)
    }

    fn zero_grad(&self) {
        AdamW::zero_grad(self)
    }
}

/// Validates the gradient of a parameter against its values and state.
///
/// # Returns
/// The dense gradient, `None` if the parameter has no gradient, or an error
/// if it's sparse or its shape differs from the parameter's or the moments'.
fn check_grad<'a>(
    id: ParamId,
    params: &ArrayD<f32>,
    grad: Option<&'a Gradient>,
    state: Option<&ParamState>,
) -> Result<Option<&'a ArrayD<f32>>> {
    let grad = match grad {
        None => return Ok(None),
        Some(Gradient::Sparse { .. }) => return Err(OptimErr::SparseGradient { id }),
        Some(Gradient::Dense(grad)) => grad,
    };

    if grad.shape() != params.shape() {
        return Err(OptimErr::ShapeMismatch {
            id,
            got: grad.shape().to_vec(),
            expected: params.shape().to_vec(),
        });
    }

    if let Some(state) = state {
        let moments = state.first_moment().shape();
        if moments != params.shape() {
            return Err(OptimErr::ShapeMismatch {
                id,
                got: params.shape().to_vec(),
                expected: moments.to_vec(),
            });
        }
    }

    Ok(Some(grad))
}

fn update_param(
    config: &AdamWConfig,
    id: ParamId,
    state: &mut Option<ParamState>,
    data: &mut ParamData,
) -> Result<()> {
    let (params, grad) = data.split_mut();

    let Some(grad) = check_grad(id, params, grad, state.as_ref())? else {
        trace!(param = id.0; "skipping parameter without gradient");
        return Ok(());
    };

    let state = state.get_or_insert_with(|| ParamState::new(params.shape()));
    state.update(config, params, grad);

    Ok(())
}
