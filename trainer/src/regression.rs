use std::num::NonZeroUsize;

use log::{debug, info};
use ndarray::{Array1, ArrayD, IxDyn};
use optimization::{AdamW, AdamWConfig, Parameter};

use crate::{config::TrainerConfig, error::Result};

/// A single feature linear model `y = w*x + b` fitted with mean squared error.
#[derive(Debug)]
pub struct LinearRegression {
    weight: Parameter,
    bias: Parameter,
    xs: Array1<f32>,
    ys: Array1<f32>,
}

impl LinearRegression {
    /// Creates a model with zeroed parameters and a synthetic dataset.
    ///
    /// # Args
    /// * `samples` - Number of points, evenly spread over `[-1, 1]`.
    /// * `slope` - The slope of the target line.
    /// * `intercept` - The intercept of the target line.
    pub fn new(samples: NonZeroUsize, slope: f32, intercept: f32) -> Self {
        let xs = Array1::linspace(-1., 1., samples.get());
        let ys = xs.mapv(|x| slope * x + intercept);

        Self {
            weight: Parameter::from(ArrayD::zeros(IxDyn(&[1]))),
            bias: Parameter::from(ArrayD::zeros(IxDyn(&[1]))),
            xs,
            ys,
        }
    }

    /// Returns handles to the trainable parameters, weight first.
    pub fn params(&self) -> [Parameter; 2] {
        [self.weight.clone(), self.bias.clone()]
    }

    pub fn weight(&self) -> f32 {
        self.weight.value()[[0]]
    }

    pub fn bias(&self) -> f32 {
        self.bias.value()[[0]]
    }

    /// Evaluates the mean squared error of the current parameters.
    pub fn loss(&self) -> f32 {
        let residual = self.residual();
        residual.mapv(|r| r * r).sum() / residual.len() as f32
    }

    /// Evaluates the loss and attaches its gradient to the parameters.
    ///
    /// # Returns
    /// The mean squared error before any update.
    pub fn backward(&self) -> f32 {
        let residual = self.residual();
        let n = residual.len() as f32;

        let loss = residual.mapv(|r| r * r).sum() / n;
        let dw = 2. * (&residual * &self.xs).sum() / n;
        let db = 2. * residual.sum() / n;

        self.weight.set_grad(ArrayD::from_elem(IxDyn(&[1]), dw));
        self.bias.set_grad(ArrayD::from_elem(IxDyn(&[1]), db));

        loss
    }

    fn residual(&self) -> Array1<f32> {
        let (w, b) = (self.weight(), self.bias());
        self.xs.mapv(|x| w * x + b) - &self.ys
    }
}

/// The outcome of a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub weight: f32,
    pub bias: f32,
    pub loss: f32,
}

/// Fits a `LinearRegression` with AdamW following `config`.
///
/// # Args
/// * `config` - The trainer configuration.
///
/// # Returns
/// The fitted parameters and their final loss, or an error if the optimizer spec is invalid.
pub fn train(config: &TrainerConfig) -> Result<Fit> {
    let model = LinearRegression::new(config.samples, config.slope, config.intercept);
    let optimizer_config = AdamWConfig::try_from(config.optimizer)?;
    let mut adamw = AdamW::new(model.params(), optimizer_config)?;

    debug!(
        epochs = config.epochs.get(),
        samples = config.samples.get();
        "starting training"
    );

    for epoch in 1..=config.epochs.get() {
        adamw.zero_grad();
        let loss = adamw.step_with(|| model.backward())?;

        if epoch % config.log_every.get() == 0 {
            info!("epoch={epoch} loss={loss:.6}");
        }
    }

    let fit = Fit {
        weight: model.weight(),
        bias: model.bias(),
        loss: model.loss(),
    };

    info!(
        "training finished: weight={:.4} bias={:.4} loss={:.6}",
        fit.weight, fit.bias, fit.loss
    );

    Ok(fit)
}
