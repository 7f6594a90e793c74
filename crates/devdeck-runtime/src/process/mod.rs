//! Process supervision: launching, output fan-out, shutdown, and probes.
//!
//! - [`ProcessManager`]: named registry driving each service's lifecycle
//! - [`LogHub`]: per-service output buffer and subscriber fan-out
//! - [`SignalBackend`]: platform specific group signalling and port cleanup
//! - [`probe_health`]: one-shot HTTP readiness check

mod broadcaster;
mod buffer;
mod done;
mod health;
mod hub;
mod managed;
mod manager;
mod ports;
mod signals;
mod stream;

pub use broadcaster::ServiceEventBroadcaster;
pub use buffer::OutputBuffer;
pub use done::DoneSignal;
pub use health::probe_health;
pub use hub::{LogHub, Unsubscribe};
pub use manager::{LogStream, ProcessManager, ProcessManagerBuilder};
pub use ports::find_listening_pids;
pub use signals::{BasicSignals, SignalBackend, default_signal_backend, exit_error};

#[cfg(unix)]
pub use signals::PosixSignals;
