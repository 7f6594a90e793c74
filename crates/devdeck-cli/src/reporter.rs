//! Terminal observer printing post-mortem output for crashed services.

use devdeck_core::{ExitError, SupervisorObserver};

/// Prints the last captured lines when a service exits with an error.
///
/// Live output is tailed through log subscriptions; this only covers the
/// crash report so it is visible even when nothing was subscribed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrashReporter;

impl SupervisorObserver for CrashReporter {
    fn on_exit(&self, service: &str, error: Option<&ExitError>, last_lines: &[String]) {
        let Some(error) = error else {
            return;
        };

        eprintln!("\n{service} {error}");
        if last_lines.is_empty() {
            eprintln!("  (no output captured)");
            return;
        }
        eprintln!("Last {} line(s) of output:", last_lines.len());
        for line in last_lines {
            eprintln!("  {line}");
        }
    }
}
