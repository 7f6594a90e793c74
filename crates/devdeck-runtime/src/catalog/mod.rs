//! Service catalog adapters.
//!
//! [`FileServiceCatalog`] reads a JSON services file of the form
//! `{ "settings": { ... }, "services": [ ... ] }`; [`InMemoryServiceCatalog`]
//! serves a fixed list and backs tests and embedders.

use async_trait::async_trait;
use devdeck_core::{CatalogError, ServiceCatalogPort, ServiceDescriptor, SupervisorSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// On-disk layout of the services file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicesFile {
    #[serde(default)]
    pub settings: SupervisorSettings,
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

/// Catalog over a fixed list of descriptors, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServiceCatalog {
    services: Vec<ServiceDescriptor>,
}

impl InMemoryServiceCatalog {
    pub const fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }
}

#[async_trait]
impl ServiceCatalogPort for InMemoryServiceCatalog {
    async fn resolve(&self, name: &str) -> Result<Option<ServiceDescriptor>, CatalogError> {
        Ok(self.services.iter().find(|s| s.name == name).cloned())
    }

    async fn group(&self, group: &str) -> Result<Vec<ServiceDescriptor>, CatalogError> {
        Ok(self
            .services
            .iter()
            .filter(|s| s.group == group)
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<ServiceDescriptor>, CatalogError> {
        Ok(self.services.clone())
    }
}

/// Catalog loaded once from a JSON services file.
///
/// Relative working directories are resolved against the file's own
/// directory so the file can be used from any current directory.
#[derive(Debug, Clone, Default)]
pub struct FileServiceCatalog {
    settings: SupervisorSettings,
    inner: InMemoryServiceCatalog,
}

impl FileServiceCatalog {
    /// Read and validate the services file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Unreadable(format!("{}: {e}", path.display())))?;

        let mut catalog = Self::from_json(&raw)?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            for service in &mut catalog.inner.services {
                if let Some(dir) = service.working_dir.as_mut().filter(|d| d.is_relative()) {
                    *dir = base.join(&*dir);
                }
            }
        }

        debug!(
            path = %path.display(),
            services = catalog.inner.services.len(),
            "Loaded services file"
        );
        Ok(catalog)
    }

    /// Parse and validate a services file body.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: ServicesFile =
            serde_json::from_str(raw).map_err(|e| CatalogError::Invalid(e.to_string()))?;
        validate_services(&file.services)?;

        Ok(Self {
            settings: file.settings,
            inner: InMemoryServiceCatalog::new(file.services),
        })
    }

    /// Supervisor settings declared alongside the services.
    pub const fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        self.inner.services()
    }
}

fn validate_services(services: &[ServiceDescriptor]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for service in services {
        if service.name.trim().is_empty() {
            return Err(CatalogError::Invalid("service name must not be empty".into()));
        }
        if service.program.as_os_str().is_empty() {
            return Err(CatalogError::Invalid(format!(
                "service `{}` has no program",
                service.name
            )));
        }
        if !seen.insert(service.name.as_str()) {
            return Err(CatalogError::Invalid(format!(
                "duplicate service name `{}`",
                service.name
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ServiceCatalogPort for FileServiceCatalog {
    async fn resolve(&self, name: &str) -> Result<Option<ServiceDescriptor>, CatalogError> {
        self.inner.resolve(name).await
    }

    async fn group(&self, group: &str) -> Result<Vec<ServiceDescriptor>, CatalogError> {
        self.inner.group(group).await
    }

    async fn list(&self) -> Result<Vec<ServiceDescriptor>, CatalogError> {
        self.inner.list().await
    }
}
