//! Probe command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Probe `127.0.0.1:{port}{path}` once.
pub async fn execute(ctx: &CliContext, port: u16, path: &str) -> Result<()> {
    if ctx.manager().probe_health(port, path).await {
        println!("127.0.0.1:{port}{path} is healthy");
        Ok(())
    } else {
        Err(CliError::Core(format!("127.0.0.1:{port}{path} is not healthy")).into())
    }
}
