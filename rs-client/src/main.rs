use std::path::PathBuf;

use bevy::prelude::*;
use clap::Parser;
use tracing::info;

use crate::config::ClientConfig;
use crate::plugins::{Locomotion, LocomotionPlugin};

mod config;
mod error;
mod plugins;
mod script;
mod systems;
mod timing;

/// Headless locomotion demo: one wolf driven by a scripted steering input.
#[derive(Parser, Debug)]
#[command(name = "rs-client", about = "Runs the neural locomotion core on a scripted character.")]
struct Args {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ticks to simulate before exiting
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for the random demo weights
    #[arg(long)]
    seed: Option<u64>,

    /// Run without a network (trajectory prediction only)
    #[arg(long)]
    no_network: bool,

    /// Disable the IK passes
    #[arg(long)]
    no_ik: bool,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

impl Args {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(ticks) = self.ticks {
            config.run.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.network.seed = seed;
        }
        if self.no_network {
            config.network.random_weights = false;
        }
        if self.no_ik {
            config.animator.solve_ik = false;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(args.log_level)
        .init();

    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => ClientConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let terrain = config.terrain.build();
    let character = Locomotion::spawn(&config, &*terrain)?;

    info!(
        ticks = config.run.ticks,
        hz = config.run.tick_hz,
        segments = config.script.len(),
        "Starting rs-client"
    );

    match App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(LocomotionPlugin::new(config, character))
        .run()
    {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(format!("app exited with code {code}").into()),
    }
}
