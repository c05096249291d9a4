use super::ResourceGroup;
use crate::error::{Result, UpError};
use crate::naming;
use crate::provider::{Platform, RegistryRecord, RegistrySpec};

/// Container registry descriptor.
///
/// Whether one must be created is decided by the app that uses it
/// (`ContainerApp::should_create_registry`). The resolver only probes a
/// registry to find the group of one the user named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    name: String,
    resource_group: ResourceGroup,
    login_server: String,
}

impl Registry {
    pub fn new(name: impl Into<String>, resource_group: ResourceGroup) -> Self {
        let name = name.into();
        let login_server = naming::login_server(&name);
        Self {
            name,
            resource_group,
            login_server,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_group(&self) -> &ResourceGroup {
        &self.resource_group
    }

    pub fn login_server(&self) -> &str {
        &self.login_server
    }

    /// Create the registry and adopt the login server the platform assigned
    pub async fn create(&mut self, platform: &Platform) -> Result<RegistryRecord> {
        let resource_group = self.resource_group.name().ok_or_else(|| {
            UpError::Validation(format!(
                "Cannot create container registry '{}' without a resource group",
                self.name
            ))
        })?;

        let spec = RegistrySpec {
            name: self.name.clone(),
            resource_group: resource_group.to_string(),
            location: self.resource_group.location().to_string(),
        };
        let record = platform.management.create_registry(&spec).await?;
        self.login_server = record.login_server.clone();
        Ok(record)
    }
}
