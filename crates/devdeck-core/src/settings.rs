//! Supervisor tuning knobs and validation.
//!
//! Pure domain types: the runtime turns these into durations and
//! capacities, adapters load them from configuration files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time `start` waits to catch immediate failures.
pub const DEFAULT_START_GRACE_MS: u64 = 500;

/// Default time `stop` waits after graceful termination before escalating.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

/// Default number of output lines kept for post-mortem display.
pub const DEFAULT_OUTPUT_BUFFER_LINES: usize = 50;

/// Supervisor settings.
///
/// Missing fields fall back to the defaults when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Grace period after spawn used to detect immediate failures.
    pub start_grace_ms: u64,

    /// How long `stop` waits for a graceful exit.
    pub stop_timeout_secs: u64,

    /// How long `stop` waits again after the forceful kill.
    pub kill_wait_secs: u64,

    /// Capacity of each service's last-output ring buffer.
    pub output_buffer_lines: usize,

    /// Capacity of each log subscriber channel.
    pub subscriber_capacity: usize,

    /// Request timeout for health probes.
    pub health_timeout_ms: u64,

    /// How long the waiter lets output readers drain after exit.
    pub drain_timeout_ms: u64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            start_grace_ms: DEFAULT_START_GRACE_MS,
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
            kill_wait_secs: 5,
            output_buffer_lines: DEFAULT_OUTPUT_BUFFER_LINES,
            subscriber_capacity: 256,
            health_timeout_ms: 2000,
            drain_timeout_ms: 1000,
        }
    }
}

impl SupervisorSettings {
    #[must_use]
    pub const fn start_grace(&self) -> Duration {
        Duration::from_millis(self.start_grace_ms)
    }

    #[must_use]
    pub const fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    #[must_use]
    pub const fn kill_wait(&self) -> Duration {
        Duration::from_secs(self.kill_wait_secs)
    }

    #[must_use]
    pub const fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    #[must_use]
    pub const fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("output_buffer_lines must be at most 100000, got {0}")]
    BufferTooLarge(usize),
}

/// Validate settings before handing them to the runtime.
pub fn validate_settings(settings: &SupervisorSettings) -> Result<(), SettingsError> {
    let checks = [
        ("start_grace_ms", settings.start_grace_ms == 0),
        ("stop_timeout_secs", settings.stop_timeout_secs == 0),
        ("kill_wait_secs", settings.kill_wait_secs == 0),
        ("output_buffer_lines", settings.output_buffer_lines == 0),
        ("subscriber_capacity", settings.subscriber_capacity == 0),
        ("health_timeout_ms", settings.health_timeout_ms == 0),
    ];
    if let Some((field, _)) = checks.iter().find(|(_, is_zero)| *is_zero) {
        return Err(SettingsError::Zero(field));
    }

    if settings.output_buffer_lines > 100_000 {
        return Err(SettingsError::BufferTooLarge(settings.output_buffer_lines));
    }

    Ok(())
}
