mod config;
mod error;
mod regression;

use std::{env, io};

use log::info;

use crate::config::TrainerConfig;

fn main() -> io::Result<()> {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => {
            info!("loading config from {path}");
            TrainerConfig::from_path(path)?
        }
        None => {
            info!("no config given, using defaults");
            TrainerConfig::default()
        }
    };

    let fit = regression::train(&config)?;
    println!(
        "weight: {:.4}, bias: {:.4}, loss: {:.6}",
        fit.weight, fit.bias, fit.loss
    );

    Ok(())
}
