//! Port → PID discovery through platform utilities.
//!
//! Used to reconcile services that outlived a previous supervisor instance:
//! nothing in the registry points at them, but they still hold their port.

use std::io;
use tokio::process::Command;
use tracing::debug;

/// PIDs of processes listening on a TCP port.
///
/// Returns an empty list when the platform's lookup utility is not
/// installed. The supervisor's own PID is never included.
pub async fn find_listening_pids(port: u16) -> io::Result<Vec<u32>> {
    let own_pid = std::process::id();
    let mut pids = lookup(port).await?;
    pids.retain(|pid| *pid != own_pid);
    pids.sort_unstable();
    pids.dedup();
    Ok(pids)
}

#[cfg(unix)]
async fn lookup(port: u16) -> io::Result<Vec<u32>> {
    let Ok(lsof) = which::which("lsof") else {
        debug!(port = %port, "lsof not available, skipping port lookup");
        return Ok(Vec::new());
    };

    let output = Command::new(lsof)
        .args(["-nP", "-t", &format!("-iTCP:{port}"), "-sTCP:LISTEN"])
        .output()
        .await?;

    classify_lsof_output(
        output.status.success(),
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    )
}

/// Interpret an lsof run.
///
/// Listed PIDs win regardless of the exit status. lsof exits 1 with no
/// output when nothing matches; an error on stderr without PIDs is a
/// failed lookup. Warnings about unreadable mounts are not errors.
#[cfg_attr(not(unix), allow(dead_code))]
pub(crate) fn classify_lsof_output(
    success: bool,
    stdout: &str,
    stderr: &str,
) -> io::Result<Vec<u32>> {
    let pids = parse_lsof_pids(stdout);
    if !pids.is_empty() || success {
        return Ok(pids);
    }

    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.contains("WARNING")
                && !line.starts_with("Output information may be incomplete")
        })
        .collect();
    if errors.is_empty() {
        Ok(pids)
    } else {
        Err(io::Error::other(format!("lsof failed: {}", errors.join("; "))))
    }
}

#[cfg(not(unix))]
async fn lookup(port: u16) -> io::Result<Vec<u32>> {
    let Ok(netstat) = which::which("netstat") else {
        debug!(port = %port, "netstat not available, skipping port lookup");
        return Ok(Vec::new());
    };

    let output = Command::new(netstat).args(["-ano", "-p", "TCP"]).output().await?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "netstat failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_netstat_pids(&String::from_utf8_lossy(&output.stdout), port))
}

/// Parse `lsof -t` output: one PID per line.
pub(crate) fn parse_lsof_pids(stdout: &str) -> Vec<u32> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .collect()
}

/// Parse `netstat -ano` output, keeping LISTENING rows bound to `port`.
#[cfg_attr(unix, allow(dead_code))]
pub(crate) fn parse_netstat_pids(stdout: &str, port: u16) -> Vec<u32> {
    let suffix = format!(":{port}");
    stdout
        .lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [proto, local, _remote, state, pid]
                    if proto.eq_ignore_ascii_case("TCP")
                        && local.ends_with(&suffix)
                        && state.eq_ignore_ascii_case("LISTENING") =>
                {
                    pid.parse::<u32>().ok()
                }
                _ => None,
            }
        })
        .collect()
}
