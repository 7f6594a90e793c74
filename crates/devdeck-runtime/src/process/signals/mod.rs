//! OS-specific process-group and signal primitives.
//!
//! The manager talks to the operating system only through [`SignalBackend`].
//! Two implementations exist and one is picked at build time:
//! - `PosixSignals`: process groups plus SIGTERM/SIGKILL via `nix`
//! - `BasicSignals`: best-effort kill through `sysinfo`, no process groups

mod basic;
#[cfg(unix)]
mod posix;

use async_trait::async_trait;
use devdeck_core::{ExitError, SupervisorError};
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Command;

pub use basic::BasicSignals;
#[cfg(unix)]
pub use posix::PosixSignals;

/// Platform primitives the process manager depends on.
#[async_trait]
pub trait SignalBackend: Send + Sync {
    /// Arrange for the child to lead its own process group.
    fn setup_group(&self, command: &mut Command);

    /// Ask the process group led by `pid` to shut down.
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Unconditionally kill the process group led by `pid`.
    fn force_kill(&self, pid: u32) -> io::Result<()>;

    /// Find processes listening on `port` and ask them to shut down.
    ///
    /// Returns the PIDs that were signalled. When no lookup utility exists
    /// on this machine the call succeeds with an empty list.
    async fn kill_by_port(&self, port: u16) -> Result<Vec<u32>, SupervisorError>;
}

/// Backend for the platform this crate was built for.
pub fn default_signal_backend() -> Arc<dyn SignalBackend> {
    #[cfg(unix)]
    {
        Arc::new(PosixSignals)
    }

    #[cfg(not(unix))]
    {
        Arc::new(BasicSignals)
    }
}

/// Classify an exit status; `None` means a clean exit.
pub fn exit_error(status: ExitStatus) -> Option<ExitError> {
    if status.success() {
        return None;
    }

    if let Some(code) = status.code() {
        return Some(ExitError::Status(code));
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(ExitError::Signal(signal));
        }
    }

    Some(ExitError::Wait(format!("unrecognised exit status: {status}")))
}

pub(crate) fn port_lookup_error(port: u16, err: &io::Error) -> SupervisorError {
    SupervisorError::PortLookup {
        port,
        reason: err.to_string(),
    }
}
