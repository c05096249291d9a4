use super::{Environment, Registry, ResourceGroup};
use crate::action::ActionType;
use crate::error::{Result, UpError};
use crate::probe::{Prober, ResourceKind};
use crate::provider::{AppRecord, AppSpec, BuildRequest, BuildResult, Platform, RegistryLogin};
use crate::request::Ingress;
use crate::state::Existence;
use std::collections::BTreeMap;
use std::path::Path;

/// Container app descriptor
///
/// The app refers to its environment only while it is being created;
/// creation is always an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerApp {
    name: String,
    resource_group: ResourceGroup,
    state: Existence,

    pub image: Option<String>,
    pub target_port: Option<u16>,
    pub ingress: Option<Ingress>,
    pub env_vars: BTreeMap<String, String>,
    pub registry_server: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    pub registry: Option<Registry>,

    /// Set when no existing registry could be resolved
    pub should_create_registry: bool,
}

impl ContainerApp {
    pub fn new(name: impl Into<String>, resource_group: ResourceGroup) -> Self {
        Self {
            name: name.into(),
            resource_group,
            state: Existence::Unknown,
            image: None,
            target_port: None,
            ingress: None,
            env_vars: BTreeMap::new(),
            registry_server: None,
            registry_username: None,
            registry_password: None,
            registry: None,
            should_create_registry: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_group(&self) -> &ResourceGroup {
        &self.resource_group
    }

    pub fn resource_group_mut(&mut self) -> &mut ResourceGroup {
        &mut self.resource_group
    }

    pub fn state(&self) -> Existence {
        self.state
    }

    pub fn exists(&self) -> bool {
        self.state.is_present()
    }

    pub async fn probe(&mut self, prober: &Prober<'_>) -> Existence {
        let outcome = prober
            .probe(
                ResourceKind::App,
                Some(&self.name),
                self.resource_group.name(),
            )
            .await;
        self.state = self.state.observe(&outcome);
        self.state
    }

    /// Current platform record, `None` on any failure
    pub async fn get(&self, platform: &Platform) -> Option<AppRecord> {
        let group = self.resource_group.name()?;
        platform.management.show_app(group, &self.name).await.ok()
    }

    /// Desired configuration sent on upsert
    pub fn spec(&self, environment: &Environment, subscription: &str) -> Result<AppSpec> {
        let resource_group = self.resource_group.name().ok_or_else(|| {
            UpError::Validation(format!(
                "Container app '{}' has no resource group",
                self.name
            ))
        })?;
        let environment_id = environment.resource_id(subscription).ok_or_else(|| {
            UpError::Validation(format!(
                "Container app '{}' has no environment to run in",
                self.name
            ))
        })?;
        let image = self.image.clone().ok_or_else(|| {
            UpError::RequiredArgumentMissing(format!(
                "No image resolved for container app '{}'",
                self.name
            ))
        })?;

        let registry = self.registry_server.as_ref().map(|server| RegistryLogin {
            server: server.clone(),
            username: self.registry_username.clone(),
            password: self.registry_password.clone(),
        });

        Ok(AppSpec {
            name: self.name.clone(),
            resource_group: resource_group.to_string(),
            environment_id,
            image,
            target_port: self.target_port,
            ingress: self.ingress,
            env_vars: self.env_vars.clone(),
            registry,
        })
    }

    /// Create or update the app
    pub async fn create(
        &mut self,
        platform: &Platform,
        environment: &Environment,
    ) -> Result<(ActionType, AppRecord)> {
        let spec = self.spec(environment, &platform.caller.subscription_id)?;

        let prober = Prober::new(platform.management.as_ref());
        let action = if self.probe(&prober).await.is_present() {
            tracing::info!(
                "Updating container app '{}' in resource group '{}'",
                spec.name,
                spec.resource_group
            );
            ActionType::Update
        } else {
            tracing::info!(
                "Creating container app '{}' in resource group '{}'",
                spec.name,
                spec.resource_group
            );
            ActionType::Create
        };

        let record = platform.management.create_or_update_app(&spec).await?;
        self.state = self.state.created();
        Ok((action, record))
    }

    /// Create the registry when none could be resolved. Runs at most once.
    pub async fn create_registry_if_needed(
        &mut self,
        platform: &Platform,
    ) -> Result<Option<ActionType>> {
        if !self.should_create_registry {
            return Ok(None);
        }
        let registry = self.registry.as_mut().ok_or_else(|| {
            UpError::Validation(format!(
                "Container app '{}' needs a registry but none was resolved",
                self.name
            ))
        })?;

        tracing::info!(
            "Creating container registry '{}' in resource group '{}'",
            registry.name(),
            registry.resource_group().name().unwrap_or_default()
        );
        let record = registry.create(platform).await?;
        self.registry_server = Some(record.login_server);
        self.should_create_registry = false;

        if self.registry_username.is_none() {
            match platform.credentials.get_credentials(&record.name).await {
                Ok(credentials) => {
                    self.registry_username = Some(credentials.username);
                    self.registry_password = Some(credentials.password);
                }
                Err(e) => tracing::warn!(
                    "Could not read credentials of new registry '{}': {}",
                    record.name,
                    e
                ),
            }
        }
        Ok(Some(ActionType::Create))
    }

    /// Queue a remote build of `source` and point the app at its output
    pub async fn run_build(
        &mut self,
        platform: &Platform,
        source: &Path,
        dockerfile: Option<&str>,
        tag: &str,
    ) -> Result<BuildResult> {
        let registry = self.registry.as_ref().ok_or_else(|| {
            UpError::Validation(format!(
                "No container registry resolved to build '{}' into",
                self.name
            ))
        })?;
        let resource_group = registry.resource_group().name().map(str::to_string);
        let server = self
            .registry_server
            .clone()
            .unwrap_or_else(|| registry.login_server().to_string());

        let image_name = format!(
            "{}:{}",
            self.image.as_deref().unwrap_or(&self.name),
            tag
        );
        let request = BuildRequest {
            resource_group,
            registry_name: registry.name().to_string(),
            image_name: image_name.clone(),
            source: source.to_path_buf(),
            dockerfile: dockerfile.map(str::to_string),
            target_port: self.target_port,
            quiet: true,
        };

        tracing::info!("Building image {} in registry {}", image_name, server);
        let result = platform.builds.queue_build(&request).await?;
        self.image = Some(format!("{}/{}", server, image_name));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> ResourceGroup {
        ResourceGroup::new(Some("web-rg".into()), "eastus")
    }

    #[test]
    fn test_spec_carries_registry_login() {
        let environment = Environment::new(Some("web-env"), group(), "eastus");
        let mut app = ContainerApp::new("web", group());
        app.image = Some("webacr.azurecr.io/web:1".into());
        app.registry_server = Some("webacr.azurecr.io".into());
        app.registry_username = Some("webacr".into());

        let spec = app.spec(&environment, "0000").unwrap();
        assert_eq!(spec.resource_group, "web-rg");
        assert!(spec.environment_id.ends_with("/managedEnvironments/web-env"));
        let login = spec.registry.unwrap();
        assert_eq!(login.server, "webacr.azurecr.io");
        assert_eq!(login.username.as_deref(), Some("webacr"));
        assert_eq!(login.password, None);
    }

    #[test]
    fn test_spec_requires_image_and_environment() {
        let unnamed = Environment::new(None, group(), "eastus");
        let mut app = ContainerApp::new("web", group());
        app.image = Some("nginx".into());
        assert!(matches!(
            app.spec(&unnamed, "0000"),
            Err(UpError::Validation(_))
        ));

        let environment = Environment::new(Some("web-env"), group(), "eastus");
        app.image = None;
        assert!(matches!(
            app.spec(&environment, "0000"),
            Err(UpError::RequiredArgumentMissing(_))
        ));
    }
}
