//! Group command handler.

use anyhow::Result;

use super::{tail, up::start_all};
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Start every service of `group` and tail the ones that came up.
pub async fn execute(ctx: &CliContext, group: &str) -> Result<()> {
    let members: Vec<String> = ctx
        .catalog()
        .services()
        .iter()
        .filter(|s| s.group == group)
        .map(|s| s.name.clone())
        .collect();

    if members.is_empty() {
        return Err(CliError::Arguments(format!("no services in group `{group}`")).into());
    }

    let streams = start_all(ctx, &members).await?;
    tail::follow(ctx, streams).await
}
