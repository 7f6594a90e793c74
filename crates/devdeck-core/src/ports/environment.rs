//! Environment provider port.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading extra environment variables.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    /// The source exists but could not be read or parsed.
    #[error("Failed to load environment from {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// Source of extra variables merged into every child's environment.
///
/// Variables are layered on top of the supervisor's own environment.
/// A missing source is not an error: implementations return an empty list.
pub trait EnvironmentPort: Send + Sync {
    /// Load `KEY=value` pairs.
    fn load(&self) -> Result<Vec<(String, String)>, EnvironmentError>;
}

/// Environment provider that adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnvironment;

impl EnvironmentPort for NoopEnvironment {
    fn load(&self) -> Result<Vec<(String, String)>, EnvironmentError> {
        Ok(Vec::new())
    }
}
