//! `.env` environment provider.

use devdeck_core::{EnvironmentError, EnvironmentPort};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads `KEY=value` pairs from a dotenv file on every launch.
///
/// The file is re-read each time so edits apply to the next start
/// without restarting the supervisor. A missing file yields no variables.
#[derive(Debug, Clone)]
pub struct DotenvEnvironment {
    path: PathBuf,
}

impl DotenvEnvironment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_error(&self, err: &dotenvy::Error) -> EnvironmentError {
        EnvironmentError::Load {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

impl EnvironmentPort for DotenvEnvironment {
    fn load(&self) -> Result<Vec<(String, String)>, EnvironmentError> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                warn!(path = %self.path.display(), "Environment file not found, skipping");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.load_error(&e)),
        };

        let vars = iter
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.load_error(&e))?;
        debug!(path = %self.path.display(), count = vars.len(), "Loaded environment file");
        Ok(vars)
    }
}
