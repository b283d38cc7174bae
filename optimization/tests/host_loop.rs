use ndarray::{ArrayD, IxDyn};
use optimization::{AdamW, AdamWConfig, Optimizer, Parameter};

/// Minimizes `sum((p - target)^2)` the way a host training loop would.
fn fit<O: Optimizer>(optimizer: &mut O, param: &Parameter, target: f32, steps: usize) -> f32 {
    let mut loss = f32::INFINITY;

    for _ in 0..steps {
        optimizer.zero_grad();

        let value = param.value();
        loss = value.mapv(|p| (p - target).powi(2)).sum();
        param.set_grad(value.mapv(|p| 2. * (p - target)));

        optimizer.step().unwrap();
    }

    loss
}

#[test]
fn converges_on_a_quadratic() {
    let param = Parameter::new(ArrayD::<f32>::zeros(IxDyn(&[4])));
    let config = AdamWConfig::new(0.1, [0.9, 0.999], 1e-6, 0., true).unwrap();
    let mut adamw = AdamW::new([param.clone()], config).unwrap();

    let loss = fit(&mut adamw, &param, 3.0, 1000);

    assert!(loss < 1e-2, "loss didn't converge: {loss}");
    param
        .value()
        .iter()
        .for_each(|p| assert!((p - 3.0).abs() < 0.1, "got {p}"));
}

#[test]
fn weight_decay_pulls_the_optimum_towards_zero() {
    let plain = Parameter::new(ArrayD::<f32>::zeros(IxDyn(&[1])));
    let decayed = Parameter::new(ArrayD::<f32>::zeros(IxDyn(&[1])));

    let mut plain_opt = AdamW::new(
        [plain.clone()],
        AdamWConfig::new(0.05, [0.9, 0.999], 1e-6, 0., true).unwrap(),
    )
    .unwrap();
    let mut decayed_opt = AdamW::new(
        [decayed.clone()],
        AdamWConfig::new(0.05, [0.9, 0.999], 1e-6, 0.5, true).unwrap(),
    )
    .unwrap();

    fit(&mut plain_opt, &plain, 2.0, 1000);
    fit(&mut decayed_opt, &decayed, 2.0, 1000);

    assert!(decayed.value()[[0]] < plain.value()[[0]]);
    assert!(decayed.value()[[0]] > 0.);
}

#[test]
fn closure_recomputes_loss_and_gradients() {
    let param = Parameter::new(ArrayD::<f32>::from_elem(IxDyn(&[2]), 1.0));
    let mut adamw = AdamW::new([param.clone()], AdamWConfig::default()).unwrap();

    let mut losses = Vec::new();
    for _ in 0..3 {
        let loss = adamw
            .step_with(|| {
                let value = param.value();
                param.set_grad(value.mapv(|p| 2. * p));
                value.mapv(|p| p * p).sum()
            })
            .unwrap();
        losses.push(loss);
    }

    assert_eq!(losses.len(), 3);
    assert!(losses.windows(2).all(|w| w[1] < w[0]), "{losses:?}");
}
