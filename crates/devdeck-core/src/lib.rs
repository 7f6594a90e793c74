//! Core domain types and ports for the devdeck process supervisor.
//!
//! This crate holds everything the supervisor needs to talk about services
//! without touching the operating system: service descriptors, lifecycle
//! states, the error taxonomy, settings, and the port traits that the
//! runtime and adapters implement.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{DEFAULT_GROUP, ExitError, ProcessInfo, ProcessState, ServiceDescriptor};
pub use error::SupervisorError;
pub use events::ServiceEvent;
pub use ports::{
    CatalogError, EnvironmentError, EnvironmentPort, NoopEnvironment, NoopObserver,
    ServiceCatalogPort, SupervisorObserver,
};
pub use settings::{SettingsError, SupervisorSettings, validate_settings};

#[cfg(test)]
use serde_json as _;
