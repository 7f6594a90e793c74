//! Process supervision runtime for devdeck.
//!
//! Launches named services as child processes in their own process groups,
//! fans their output out to subscribers, and tears them down with a
//! graceful-then-forceful escalation. Also ships the file-backed service
//! catalog and the `.env` environment provider used by the adapters.
#![deny(unsafe_code)]

pub mod catalog;
pub mod env;
pub mod process;

pub use catalog::{FileServiceCatalog, InMemoryServiceCatalog, ServicesFile};
pub use env::DotenvEnvironment;
pub use process::{
    DoneSignal, LogHub, LogStream, OutputBuffer, ProcessManager, ProcessManagerBuilder, ServiceEventBroadcaster,
    SignalBackend, Unsubscribe, default_signal_backend, probe_health,
};
