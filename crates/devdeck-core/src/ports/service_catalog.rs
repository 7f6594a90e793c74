//! Service configuration provider port.

use async_trait::async_trait;

use super::CatalogError;
use crate::domain::ServiceDescriptor;

/// Read-only source of service descriptors.
///
/// Implementations may be backed by a file, a database, or a fixed list.
/// Lookups are by exact name; groups are exact tag matches.
#[async_trait]
pub trait ServiceCatalogPort: Send + Sync {
    /// Resolve a single service by name.
    ///
    /// Returns `Ok(None)` when no descriptor carries that name.
    async fn resolve(&self, name: &str) -> Result<Option<ServiceDescriptor>, CatalogError>;

    /// All descriptors tagged with `group`, in configuration order.
    async fn group(&self, group: &str) -> Result<Vec<ServiceDescriptor>, CatalogError>;

    /// Every known descriptor, in configuration order.
    async fn list(&self) -> Result<Vec<ServiceDescriptor>, CatalogError>;
}
