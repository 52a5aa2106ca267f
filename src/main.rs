//! Padboard CLI - Drum Sampler Layout Tool
//!
//! Command-line interface for screen classification, pad grids and layout presets.

use clap::Parser;
use env_logger::Env;
use log::info;

use padboard::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Padboard v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd).await,
        None => {
            println!("Padboard v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Classify {
            width,
            height,
            landscape,
        } => commands::classify(width, height, landscape),
        Commands::Grid {
            width,
            height,
            pads,
            landscape,
        } => commands::grid(width, height, pads, landscape),
        Commands::Presets { store, action } => commands::presets(&store, action).await,
    }
}
