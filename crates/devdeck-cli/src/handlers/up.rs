//! Up command handler.

use anyhow::Result;
use devdeck_core::SupervisorError;
use devdeck_runtime::LogStream;
use futures_util::future::join_all;
use tracing::error;

use super::tail;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Start the named services and tail them until Ctrl-C.
///
/// Services that fail to launch are reported and skipped; the command
/// fails only when none could be started.
pub async fn execute(ctx: &CliContext, names: &[String]) -> Result<()> {
    let streams = start_all(ctx, names).await?;
    tail::follow(ctx, streams).await
}

/// Start `names` concurrently, subscribing to each right after spawn so
/// output from the start grace period is tailed too.
pub(crate) async fn start_all(
    ctx: &CliContext,
    names: &[String],
) -> Result<Vec<(String, LogStream)>> {
    let manager = ctx.manager();
    let results = join_all(names.iter().map(|name| async move {
        (name.clone(), manager.start_subscribed(name).await)
    }))
    .await;

    let mut streams = Vec::with_capacity(results.len());
    let mut last_failure = None;
    for (name, result) in results {
        match result {
            Ok(stream) => streams.push((name, stream)),
            Err(SupervisorError::AlreadyRunning(_)) => {
                let stream = manager.subscribe_logs(&name).await;
                streams.push((name, stream));
            }
            Err(e) => {
                report_failure(&e);
                last_failure = Some(e);
            }
        }
    }

    if streams.is_empty() {
        if let Some(e) = last_failure {
            return Err(CliError::from(e).into());
        }
    }
    Ok(streams)
}

/// Output of a crashed child is printed by the crash reporter already.
fn report_failure(err: &SupervisorError) {
    error!("{err}");
}
