//! `stagewise` command line: dry-run training loops and schedule previews.

mod commands;
mod config;
mod hooks;
mod telemetry;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stagewise")]
#[command(about = "Staged learning rate training loop controller")]
#[command(version)]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the training loop with dry-run hooks
    Train {
        /// Settings file (defaults to ./train.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the loop in inference mode
    Inference {
        /// Settings file (defaults to ./inference.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the learning rate at regular iterations
    Schedule {
        /// Settings file (defaults to ./schedule.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log);

    match cli.command {
        Commands::Train { config } => commands::run_train(config),
        Commands::Inference { config } => commands::run_inference(config),
        Commands::Schedule { config } => commands::run_schedule(config),
    }
}
