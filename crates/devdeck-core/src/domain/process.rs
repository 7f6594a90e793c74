//! Lifecycle state of supervised processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of a managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// Not running; either never started or exited cleanly.
    #[default]
    Stopped,
    /// Spawned and inside the start grace period.
    Starting,
    /// Survived the grace period.
    Running,
    /// Stop requested, waiting for the process to exit.
    Stopping,
    /// Failed to launch or exited with a non-zero status or signal.
    Error,
}

impl ProcessState {
    /// Whether an OS process may currently exist for this state.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }

    /// Whether the state only changes through a new `start`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Error)
    }

    /// Lowercase label used in logs and tables.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a process exit counts as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ExitError {
    /// Exited with a non-zero status code.
    #[error("exited with status {0}")]
    Status(i32),
    /// Killed by a signal.
    #[error("terminated by signal {0}")]
    Signal(i32),
    /// The OS refused to spawn the executable.
    #[error("failed to spawn: {0}")]
    Spawn(String),
    /// Waiting on the child failed.
    #[error("failed to wait on process: {0}")]
    Wait(String),
}

/// Point-in-time snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub name: String,
    pub group: String,
    pub state: ProcessState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(ProcessState::Running.is_active());
        assert!(ProcessState::Starting.is_active());
        assert!(ProcessState::Stopping.is_active());
        assert!(!ProcessState::Error.is_active());

        assert!(ProcessState::Stopped.is_terminal());
        assert!(ProcessState::Error.is_terminal());
        assert!(!ProcessState::Running.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ProcessState::Stopping).unwrap();
        assert_eq!(json, "\"stopping\"");
        assert_eq!(ProcessState::Error.to_string(), "error");
    }

    #[test]
    fn test_exit_error_messages() {
        assert_eq!(ExitError::Status(3).to_string(), "exited with status 3");
        assert_eq!(ExitError::Signal(9).to_string(), "terminated by signal 9");
    }

    #[test]
    fn test_process_info_skips_empty_fields() {
        let info = ProcessInfo {
            name: "api".to_string(),
            group: "mesh".to_string(),
            state: ProcessState::Stopped,
            pid: None,
            port: None,
            started_at: None,
            last_error: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"state\":\"stopped\""));
        assert!(!json.contains("pid"));
        assert!(!json.contains("lastError"));
    }
}
