//! Best-effort backend for platforms without POSIX process groups.
//!
//! Only the direct child is killed; grandchildren may outlive it.

use async_trait::async_trait;
use devdeck_core::SupervisorError;
use std::io;
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::process::Command;
use tracing::{debug, info};

use super::{SignalBackend, port_lookup_error};
use crate::process::ports::find_listening_pids;

/// Kill-only backend built on `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSignals;

/// Send `signal` (falling back to a plain kill) to `pid` if it exists.
///
/// Returns whether a live process was found.
fn kill_with(pid: u32, signal: Signal) -> bool {
    let sys_pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);

    match system.process(sys_pid) {
        Some(process) => {
            let delivered = process.kill_with(signal).unwrap_or_else(|| process.kill());
            debug!(pid = %pid, ?signal, delivered, "Killed process");
            true
        }
        None => false,
    }
}

#[async_trait]
impl SignalBackend for BasicSignals {
    fn setup_group(&self, _command: &mut Command) {}

    fn terminate(&self, pid: u32) -> io::Result<()> {
        kill_with(pid, Signal::Term);
        Ok(())
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        kill_with(pid, Signal::Kill);
        Ok(())
    }

    async fn kill_by_port(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
        let pids = find_listening_pids(port)
            .await
            .map_err(|e| port_lookup_error(port, &e))?;

        let signalled: Vec<u32> = pids
            .into_iter()
            .filter(|pid| kill_with(*pid, Signal::Term))
            .collect();
        if !signalled.is_empty() {
            info!(port = %port, pids = ?signalled, "Killed processes bound to port");
        }
        Ok(signalled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn killing_a_missing_pid_is_ok() {
        assert!(BasicSignals.terminate(999_999).is_ok());
        assert!(BasicSignals.force_kill(999_999).is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn force_kill_ends_a_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");
        let pid = child.id().expect("no PID");

        BasicSignals.force_kill(pid).expect("force_kill failed");
        let status = child.wait().await.expect("wait failed");
        assert!(!status.success());
    }
}
