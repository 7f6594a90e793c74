//! Async output readers (non-UTF8-safe).
//!
//! Dev tooling freely emits non-UTF8 bytes on stdout/stderr, and
//! `BufReader::lines()` would end the reader on the first invalid byte.
//! Lines are read as bytes and decoded lossily instead.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use super::hub::LogHub;

/// Spawn a task that forwards every line of `stream` to `hub`.
///
/// The task ends at EOF or on the first read error; neither is reported as
/// a process failure.
pub(crate) fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    service: String,
    stream_type: &'static str,
    hub: Arc<LogHub>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    debug!(service = %service, %stream_type, "{}", line);
                    hub.broadcast(line);
                }
                Err(e) => {
                    debug!(service = %service, %stream_type, error = %e, "Output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(service = %service, %stream_type, "Output reader task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdeck_core::NoopObserver;

    #[tokio::test]
    async fn test_reader_decodes_lossily_and_trims_newlines() {
        let hub = Arc::new(LogHub::new("svc", 10, 8, Arc::new(NoopObserver)));
        let input: &[u8] = b"first\r\nbad \xff byte\nlast without newline";

        spawn_stream_reader(input, "svc".to_string(), "stdout", hub.clone())
            .await
            .unwrap();

        assert_eq!(
            hub.snapshot(),
            vec!["first", "bad \u{fffd} byte", "last without newline"]
        );
    }
}
