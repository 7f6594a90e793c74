//! POSIX backend: process groups with SIGTERM → SIGKILL.

use async_trait::async_trait;
use devdeck_core::SupervisorError;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io;
use tokio::process::Command;
use tracing::{debug, info};

use super::{SignalBackend, port_lookup_error};
use crate::process::ports::find_listening_pids;

/// Signals delivered with `killpg` to the child's own process group.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixSignals;

fn to_pid(pid: u32) -> io::Result<Pid> {
    i32::try_from(pid)
        .map(Pid::from_raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range")))
}

fn signal_group(pid: u32, sig: Signal) -> io::Result<()> {
    match signal::killpg(to_pid(pid)?, sig) {
        Ok(()) => Ok(()),
        // Group already gone
        Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[async_trait]
impl SignalBackend for PosixSignals {
    fn setup_group(&self, command: &mut Command) {
        command.process_group(0);
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        debug!(pid = %pid, "Sending SIGTERM to process group");
        signal_group(pid, Signal::SIGTERM)
    }

    fn force_kill(&self, pid: u32) -> io::Result<()> {
        debug!(pid = %pid, "Sending SIGKILL to process group");
        signal_group(pid, Signal::SIGKILL)
    }

    async fn kill_by_port(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
        let pids = find_listening_pids(port)
            .await
            .map_err(|e| port_lookup_error(port, &e))?;

        let mut signalled = Vec::with_capacity(pids.len());
        for pid in pids {
            match signal::kill(to_pid(pid).map_err(|e| port_lookup_error(port, &e))?, Signal::SIGTERM) {
                Ok(()) => {
                    info!(port = %port, pid = %pid, "Sent SIGTERM to process bound to port");
                    signalled.push(pid);
                }
                Err(Errno::ESRCH) => {}
                Err(e) => {
                    return Err(SupervisorError::PortLookup {
                        port,
                        reason: format!("failed to signal pid {pid}: {e}"),
                    });
                }
            }
        }
        Ok(signalled)
    }
}
