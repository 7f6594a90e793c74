//! Domain types for supervised services.

mod process;
mod service;

pub use process::{ExitError, ProcessInfo, ProcessState};
pub use service::{DEFAULT_GROUP, ServiceDescriptor};
