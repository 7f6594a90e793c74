//! Observer port for output and exit notifications.

use crate::domain::ExitError;

/// Receives cross-service activity from the supervisor.
///
/// Callbacks run on the supervisor's reader and waiter tasks, outside any
/// registry lock, so they may call back into the manager. They should
/// still return quickly: `on_output_line` sits on the path that drains a
/// child's stdout/stderr.
pub trait SupervisorObserver: Send + Sync {
    /// Called for every line any service writes to stdout or stderr.
    fn on_output_line(&self, _service: &str, _line: &str) {}

    /// Called exactly once per process exit.
    ///
    /// `error` is `None` for a clean exit (status zero or a requested stop).
    fn on_exit(&self, _service: &str, _error: Option<&ExitError>, _last_lines: &[String]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SupervisorObserver for NoopObserver {}
