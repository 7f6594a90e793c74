//! Live output and lifecycle tailing shared by `up` and `group`.

use anyhow::Result;
use devdeck_core::ProcessState;
use devdeck_runtime::LogStream;
use futures_util::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Print the given streams until their services all exit or Ctrl-C, then stop everything.
pub(crate) async fn follow(ctx: &CliContext, streams: Vec<(String, LogStream)>) -> Result<()> {
    let manager = ctx.manager();
    let names: Vec<String> = streams.iter().map(|(name, _)| name.clone()).collect();

    let mut printers = Vec::with_capacity(streams.len());
    for (prefix, (mut rx, handle)) in streams {
        printers.push(tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                println!("[{prefix}] {line}");
            }
            handle.unsubscribe();
        }));
    }

    let mut events = manager.events();
    let event_printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match (&event.state, &event.error) {
                    (ProcessState::Error, Some(error)) => {
                        eprintln!("* {} {}: {}", event.service, event.state, error);
                    }
                    _ => eprintln!("* {} {}", event.service, event.state),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Lifecycle event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut signals = Vec::with_capacity(names.len());
    for name in &names {
        if let Some(signal) = manager.done_signal(name).await {
            signals.push(signal);
        }
    }
    let all_exited = join_all(signals.iter_mut().map(|signal| signal.wait()));

    tokio::select! {
        _ = all_exited => info!("All services exited"),
        result = tokio::signal::ctrl_c() => {
            result.map_err(CliError::from)?;
            info!("Interrupt received, stopping services");
        }
    }

    manager.stop_all().await?;
    join_all(printers).await;
    event_printer.abort();
    Ok(())
}
