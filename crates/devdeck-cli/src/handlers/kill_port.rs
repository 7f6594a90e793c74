//! Kill-port command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Ask whatever listens on `port` to terminate.
pub async fn execute(ctx: &CliContext, port: u16) -> Result<()> {
    let pids = ctx
        .manager()
        .kill_process_on_port(port)
        .await
        .map_err(CliError::from)?;

    if pids.is_empty() {
        println!("Nothing is listening on port {port}.");
    } else {
        let list: Vec<String> = pids.iter().map(ToString::to_string).collect();
        println!("Sent termination to PID(s) {} on port {port}.", list.join(", "));
    }
    Ok(())
}
