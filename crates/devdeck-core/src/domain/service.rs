//! Static service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Group assigned to services that do not declare one.
pub const DEFAULT_GROUP: &str = "default";

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// Launch description of a single service.
///
/// Supplied by configuration and never mutated by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Unique service name (registry key).
    pub name: String,
    /// Group tag used by group start/stop.
    #[serde(default = "default_group")]
    pub group: String,
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory for the child (inherits the supervisor's when unset).
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// TCP port the service listens on, if any.
    #[serde(default)]
    pub port: Option<u16>,
    /// HTTP path answered by the service's health endpoint.
    #[serde(default)]
    pub health_path: Option<String>,
}

impl ServiceDescriptor {
    /// Create a descriptor in the default group with no arguments.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            group: default_group(),
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            port: None,
            health_path: None,
        }
    }

    /// Set the group tag.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Declare the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Declare the health check path.
    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = Some(path.into());
        self
    }

    /// Health path to probe, falling back to `/`.
    pub fn effective_health_path(&self) -> &str {
        self.health_path.as_deref().unwrap_or("/")
    }
}
