//! Main CLI parser and top-level argument handling.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Command-line interface for the local service supervisor.
#[derive(Parser)]
#[command(name = "devdeck")]
#[command(about = "Run and supervise local development services")]
#[command(version)]
pub struct Cli {
    /// Services file to load
    #[arg(
        short = 'c',
        long = "config",
        env = "DEVDECK_CONFIG",
        default_value = "devdeck.json",
        global = true
    )]
    pub config: PathBuf,

    /// Extra variables for every service (defaults to `.env` next to the services file)
    #[arg(long = "env-file", global = true)]
    pub env_file: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
