use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod retry;
mod shutdown;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "radar")]
#[command(version)]
#[command(about = "External CS2 player reader")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "radar.toml")]
    config: PathBuf,

    /// Executable name of the game process
    #[arg(short, long, env = "RADAR_PROCESS")]
    process: Option<String>,

    /// Milliseconds between two sweeps
    #[arg(short, long)]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the game and print one JSON line per refresh (default)
    Run,
    /// Resolve offsets once and print them
    Offsets {
        /// Write the dump to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("radar=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        let config = CliConfig::load(&args.config)?;
        info!("Loaded config from {:?}", args.config);
        config
    } else {
        if args.config != PathBuf::from("radar.toml") {
            warn!("Config file {:?} not found, using defaults", args.config);
        }
        CliConfig::default()
    };
    if let Some(process) = args.process {
        config.process_name = process;
    }
    if let Some(interval) = args.interval {
        config.refresh_interval_ms = interval;
    }

    match args.command.unwrap_or(Command::Run) {
        Command::Run => commands::run::run(&config),
        Command::Offsets { output } => commands::offsets::run(&config, output.as_deref()),
    }
}
