//! Port definitions (trait abstractions) for the supervisor's collaborators.
//!
//! Ports describe what the supervisor expects from configuration, the
//! environment, and its observers. They contain no implementation details
//! and use only domain types.

pub mod environment;
pub mod observer;
pub mod service_catalog;

use thiserror::Error;

pub use environment::{EnvironmentError, EnvironmentPort, NoopEnvironment};
pub use observer::{NoopObserver, SupervisorObserver};
pub use service_catalog::ServiceCatalogPort;

/// Errors that can occur while querying the service catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backing configuration could not be read.
    #[error("Failed to read service configuration: {0}")]
    Unreadable(String),

    /// The configuration was read but is malformed.
    #[error("Invalid service configuration: {0}")]
    Invalid(String),
}
