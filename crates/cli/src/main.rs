// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jobctl - job admission for shared resources

mod commands;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use commands::{config, scenario, stress};

#[derive(Parser)]
#[command(
    name = "jobctl",
    version,
    about = "Job admission and mutual exclusion for shared resources"
)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective coordinator configuration
    Config(config::ConfigArgs),
    /// Run an async job, a query beside it, and a modification after it
    Scenario(scenario::ScenarioArgs),
    /// Hammer a coordinator from many threads
    Stress(stress::StressArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Config(args) => config::handle(args),
        Commands::Scenario(args) => scenario::handle(args),
        Commands::Stress(args) => stress::handle(args),
    }
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
