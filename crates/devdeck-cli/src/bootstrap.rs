//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the supervisor is wired together
//! for the CLI adapter:
//! - Service catalog and settings (via `FileServiceCatalog`)
//! - Child environment (via `DotenvEnvironment`)
//! - Crash reporting observer
//!
//! Command handlers receive the composed `CliContext`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use devdeck_core::validate_settings;
use devdeck_runtime::{DotenvEnvironment, FileServiceCatalog, ProcessManager};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;
use crate::reporter::CrashReporter;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Services file to load.
    pub config_path: PathBuf,
    /// Dotenv file merged into every child's environment.
    pub env_file: PathBuf,
}

impl CliConfig {
    /// Resolve paths from parsed arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new(cli.config.clone(), cli.env_file.clone())
    }

    /// The env file defaults to `.env` beside the services file.
    pub fn new(config_path: PathBuf, env_file: Option<PathBuf>) -> Self {
        let env_file = env_file.unwrap_or_else(|| default_env_file(&config_path));
        Self {
            config_path,
            env_file,
        }
    }
}

fn default_env_file(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from(".env"), |dir| dir.join(".env"))
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// The supervisor.
    pub manager: ProcessManager,
    /// Services loaded from the configuration file.
    pub catalog: Arc<FileServiceCatalog>,
}

impl CliContext {
    pub const fn manager(&self) -> &ProcessManager {
        &self.manager
    }

    pub fn catalog(&self) -> &FileServiceCatalog {
        &self.catalog
    }
}

/// Load configuration and build the supervisor.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext> {
    let catalog = FileServiceCatalog::load(&config.config_path).map_err(CliError::from)?;
    compose(config, catalog)
}

/// Like [`bootstrap`], but a missing services file yields an empty catalog
/// with default settings.
pub fn bootstrap_optional(config: &CliConfig) -> Result<CliContext> {
    if config.config_path.exists() {
        bootstrap(config)
    } else {
        debug!(config = %config.config_path.display(), "No services file, using defaults");
        compose(config, FileServiceCatalog::default())
    }
}

fn compose(config: &CliConfig, catalog: FileServiceCatalog) -> Result<CliContext> {
    let catalog = Arc::new(catalog);
    let settings = catalog.settings().clone();
    validate_settings(&settings).map_err(CliError::from)?;

    debug!(
        config = %config.config_path.display(),
        env_file = %config.env_file.display(),
        services = catalog.services().len(),
        "Bootstrapping supervisor"
    );

    let manager = ProcessManager::builder(catalog.clone())
        .settings(settings)
        .environment(Arc::new(DotenvEnvironment::new(&config.env_file)))
        .observer(Arc::new(CrashReporter))
        .build();

    Ok(CliContext { manager, catalog })
}
