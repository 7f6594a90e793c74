//! Registry entry for one supervised process instance.

use chrono::{DateTime, Utc};
use devdeck_core::{ProcessInfo, ProcessState, ServiceDescriptor};
use std::sync::Arc;

use super::done::DoneSignal;
use super::hub::LogHub;

/// One supervised child and its last-known lifecycle state.
///
/// The lifecycle fields are only touched under the manager's registry
/// lock; the hub carries its own finer-grained lock for log traffic.
pub(crate) struct ManagedProcess {
    /// Instance id, distinguishes a recycled entry from its predecessor.
    pub instance: u64,
    pub descriptor: ServiceDescriptor,
    pub state: ProcessState,
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub hub: Arc<LogHub>,
    pub done: DoneSignal,
}

impl ManagedProcess {
    pub fn new(
        instance: u64,
        descriptor: ServiceDescriptor,
        hub: Arc<LogHub>,
        done: DoneSignal,
    ) -> Self {
        Self {
            instance,
            descriptor,
            state: ProcessState::Starting,
            pid: None,
            started_at: None,
            last_error: None,
            hub,
            done,
        }
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            name: self.descriptor.name.clone(),
            group: self.descriptor.group.clone(),
            state: self.state,
            pid: self.pid,
            port: self.descriptor.port,
            started_at: self.started_at,
            last_error: self.last_error.clone(),
        }
    }
}
