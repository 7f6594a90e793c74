//! Supervisor error taxonomy.
//!
//! Adapters map these to their own presentation (exit codes, UI toasts).
//! A shutdown timeout is deliberately absent: it is escalated to a forceful
//! kill inside the runtime and never reaches callers.

use thiserror::Error;

use crate::ports::CatalogError;

/// Errors returned by process manager operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The name has no descriptor in the service catalog.
    #[error("unknown service `{0}`")]
    UnknownService(String),

    /// `start` was called for a service that is already active.
    #[error("service `{0}` is already running")]
    AlreadyRunning(String),

    /// The executable could not be spawned or died within the grace period.
    #[error("failed to launch `{name}`: {reason}")]
    LaunchFailure {
        name: String,
        reason: String,
        /// Output captured before the failure, oldest first.
        output: Vec<String>,
    },

    /// One or more services of a group failed to start or stop.
    #[error("group `{group}` partially failed: {}", summarize(.failures))]
    GroupPartialFailure {
        group: String,
        failures: Vec<(String, SupervisorError)>,
    },

    /// The service catalog could not be queried.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The port lookup utility ran but did not produce a usable answer.
    #[error("port lookup for {port} failed: {reason}")]
    PortLookup { port: u16, reason: String },
}

impl SupervisorError {
    /// Names of the services that failed inside a group operation.
    pub fn failed_services(&self) -> Vec<&str> {
        match self {
            Self::GroupPartialFailure { failures, .. } => {
                failures.iter().map(|(name, _)| name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Output captured before a launch failure.
    pub fn captured_output(&self) -> &[String] {
        match self {
            Self::LaunchFailure { output, .. } => output,
            _ => &[],
        }
    }
}

fn summarize(failures: &[(String, SupervisorError)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
