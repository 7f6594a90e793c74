//! Service lifecycle events.
//!
//! Emitted by the process manager on every state transition and consumed by
//! dashboards to keep their view of service state in sync.

use serde::{Deserialize, Serialize};

use crate::domain::ProcessState;

/// A single lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEvent {
    /// Service the transition belongs to.
    pub service: String,
    /// State entered.
    pub state: ProcessState,
    /// OS process id, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Failure description for `Error` transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix timestamp in milliseconds when the transition was recorded.
    pub updated_at: u64,
}

impl ServiceEvent {
    /// Create an event stamped with the current time.
    pub fn new(service: impl Into<String>, state: ProcessState) -> Self {
        Self {
            service: service.into(),
            state,
            pid: None,
            error: None,
            updated_at: now_ms(),
        }
    }

    /// Attach the process id.
    #[must_use]
    pub const fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attach a failure description.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
