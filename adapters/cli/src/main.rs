#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted Berry Grove session.

mod scenario;
mod scene;

use std::{path::PathBuf, rc::Rc};

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::{scenario::Scenario, scene::LogScene};

/// Plays a scripted Berry Grove session and prints its totals.
#[derive(Debug, Parser)]
#[command(name = "berry-grove", version, about)]
struct Cli {
    /// Scenario TOML to play; a built-in session runs when omitted.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,

    /// Overrides the scenario length in seconds.
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f32>,

    /// Enables debug logging unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Berry Grove command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut scenario = match &cli.scenario {
        Some(path) => {
            info!("loading scenario {}", path.display());
            Scenario::load(path)?
        }
        None => Scenario::built_in()?,
    };
    if let Some(seconds) = cli.duration {
        scenario.set_duration(seconds)?;
    }

    let summary = scenario.run(Rc::new(LogScene))?;
    println!("{summary}");
    Ok(())
}
