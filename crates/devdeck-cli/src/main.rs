//! CLI entry point - the composition root.
//!
//! Wiring happens in `bootstrap`; this file only initialises logging,
//! parses arguments, and dispatches to handlers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use devdeck_cli::bootstrap::bootstrap_optional;
use devdeck_cli::error::exit_code_for;
use devdeck_cli::{Cli, CliConfig, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables before parsing so DEVDECK_CONFIG applies
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli);

    match cli.command {
        Commands::List => handlers::list::execute(&bootstrap(&config)?).await,
        Commands::Up { names } => handlers::up::execute(&bootstrap(&config)?, &names).await,
        Commands::Group { group } => {
            handlers::group::execute(&bootstrap(&config)?, &group).await
        }
        // Port utilities work without a services file
        Commands::Probe { port, path } => {
            handlers::probe::execute(&bootstrap_optional(&config)?, port, &path).await
        }
        Commands::KillPort { port } => {
            handlers::kill_port::execute(&bootstrap_optional(&config)?, port).await
        }
    }
}
