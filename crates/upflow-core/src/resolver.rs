//! Defaulting resolver
//!
//! Fills in what the user left out by looking at what already exists on
//! the platform. Resolution runs as a fixed pipeline of [`Step`]s; each
//! step consumes the current [`Resolution`] and returns the next one, and
//! only acts when the value it targets is still unset.

use crate::error::{Result, UpError};
use crate::naming;
use crate::probe::{Prober, ResourceKind};
use crate::provider::{EnvironmentRecord, Platform};
use crate::request::{DeployMode, UpRequest};
use crate::state::Existence;

/// Registry the app will pull from or build into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryBinding {
    pub name: String,
    pub resource_group: Option<String>,
}

/// Partially resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub app_name: String,
    pub mode: DeployMode,

    /// Group as the user passed it
    pub requested_group: Option<String>,
    pub resource_group: Option<String>,
    pub group_state: Existence,

    /// Environment name or fully-qualified id
    pub environment: Option<String>,

    pub location: Option<String>,
    pub logs_customer_id: Option<String>,
    pub image: Option<String>,
    pub registry_server: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    pub registry: Option<RegistryBinding>,
    pub should_create_registry: bool,
}

impl Resolution {
    pub fn from_request(request: &UpRequest) -> Self {
        Self {
            app_name: request.name.clone(),
            mode: request.mode(),
            requested_group: request.resource_group.clone(),
            resource_group: request.resource_group.clone(),
            group_state: Existence::Unknown,
            environment: request.environment.clone(),
            location: request.location.clone(),
            logs_customer_id: request.logs_customer_id.clone(),
            image: request.reformatted_image(),
            registry_server: request.registry_server.clone(),
            registry_username: request.registry_username.clone(),
            registry_password: request.registry_password.clone(),
            registry: None,
            should_create_registry: false,
        }
    }

    fn has_registry_credentials(&self) -> bool {
        self.registry_username.is_some() && self.registry_password.is_some()
    }
}

/// Resolution steps, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Probe the group the user named
    ProbeRequestedGroup,
    /// Adopt group and environment of a single existing app with this name
    AppIdentity,
    /// Adopt an environment matching the log workspace and location
    EnvironmentByTelemetry,
    /// Look up credentials of a platform registry named in the image
    RegistryFromImage,
    /// Give a still-unnamed group a randomized name
    NameNewResources,
    /// Reuse the registry an existing app already pulls from
    RegistryFromApp,
    /// Resolve credentials of the chosen registry, or plan a new one
    RegistryDetails,
}

impl Step {
    pub const PIPELINE: [Step; 7] = [
        Step::ProbeRequestedGroup,
        Step::AppIdentity,
        Step::EnvironmentByTelemetry,
        Step::RegistryFromImage,
        Step::NameNewResources,
        Step::RegistryFromApp,
        Step::RegistryDetails,
    ];
}

pub struct Resolver<'a> {
    platform: &'a Platform,
}

impl<'a> Resolver<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    /// Run the whole pipeline
    pub async fn resolve(&self, request: &UpRequest) -> Result<Resolution> {
        let mut resolution = Resolution::from_request(request);
        for step in Step::PIPELINE {
            resolution = self.apply(step, resolution).await?;
        }
        Ok(resolution)
    }

    /// Run a single step
    pub async fn apply(&self, step: Step, resolution: Resolution) -> Result<Resolution> {
        tracing::debug!("Resolving: {:?}", step);
        match step {
            Step::ProbeRequestedGroup => Ok(self.probe_requested_group(resolution).await),
            Step::AppIdentity => self.app_identity(resolution).await,
            Step::EnvironmentByTelemetry => Ok(self.environment_by_telemetry(resolution).await),
            Step::RegistryFromImage => self.registry_from_image(resolution).await,
            Step::NameNewResources => Ok(self.name_new_resources(resolution)),
            Step::RegistryFromApp => Ok(self.registry_from_app(resolution).await),
            Step::RegistryDetails => self.registry_details(resolution).await,
        }
    }

    async fn probe_requested_group(&self, mut r: Resolution) -> Resolution {
        let prober = Prober::new(self.platform.management.as_ref());
        let outcome = prober
            .probe(ResourceKind::ResourceGroup, r.requested_group.as_deref(), None)
            .await;
        r.group_state = r.group_state.observe(&outcome);
        r
    }

    async fn app_identity(&self, mut r: Resolution) -> Result<Resolution> {
        if r.resource_group.is_some() || r.group_state.is_present() {
            return Ok(r);
        }

        let apps = match self.platform.management.list_apps(None).await {
            Ok(apps) => apps,
            Err(e) => {
                tracing::warn!("Could not list container apps, skipping lookup: {}", e);
                return Ok(r);
            }
        };
        let matched: Vec<_> = apps
            .into_iter()
            .filter(|a| a.name.eq_ignore_ascii_case(&r.app_name))
            .collect();

        match matched.as_slice() {
            [] => Ok(r),
            [app] => {
                if r.environment.is_some() {
                    tracing::warn!(
                        "User passed custom environment name for an existing container app. Using existing environment."
                    );
                }
                r.resource_group = app.resource_group();
                if let Some(env_id) = &app.environment_id {
                    r.environment = Some(env_id.clone());
                }
                tracing::info!(
                    "Found existing container app '{}' in resource group '{}'",
                    app.name,
                    r.resource_group.as_deref().unwrap_or_default()
                );
                Ok(r)
            }
            _ => Err(UpError::Validation(format!(
                "There are multiple container apps with name {} on the subscription. \
                 Please specify which resource group your container app is in.",
                r.app_name
            ))),
        }
    }

    async fn environment_by_telemetry(&self, mut r: Resolution) -> Resolution {
        if r.environment.is_some() {
            return r;
        }
        let searchable = match &r.requested_group {
            None => true,
            Some(_) => r.group_state.is_present(),
        };
        if !searchable {
            return r;
        }

        let environments = match self
            .platform
            .management
            .list_environments(r.requested_group.as_deref())
            .await
        {
            Ok(envs) => envs,
            Err(e) => {
                tracing::warn!("Could not list environments, skipping lookup: {}", e);
                return r;
            }
        };

        if let Some(env) = pick_environment(
            environments,
            r.logs_customer_id.as_deref(),
            r.location.as_deref(),
        ) {
            tracing::info!("Using existing environment '{}'", env.name);
            r.resource_group = env.resource_group().or(r.resource_group);
            r.environment = Some(env.id);
        }
        r
    }

    async fn registry_from_image(&self, mut r: Resolution) -> Result<Resolution> {
        let image = match &r.image {
            Some(image) if naming::is_platform_registry(image) => image.clone(),
            _ => return Ok(r),
        };
        if r.has_registry_credentials() {
            return Ok(r);
        }

        tracing::info!(
            "No credential was provided to access the container registry. Trying to look up..."
        );
        let server = image.split('/').next().unwrap_or(&image).to_string();
        let name = naming::registry_name_from_server(&server);
        let credentials = self
            .platform
            .credentials
            .get_credentials(&name)
            .await
            .map_err(|e| {
                UpError::RequiredArgumentMissing(format!(
                    "Failed to retrieve credentials for container registry {}: {}. \
                     Please provide the registry username and password",
                    name, e
                ))
            })?;

        r.registry_server = Some(server);
        r.registry_username = Some(credentials.username);
        r.registry_password = Some(credentials.password);
        r.registry = Some(RegistryBinding {
            name,
            resource_group: Some(credentials.resource_group),
        });
        Ok(r)
    }

    fn name_new_resources(&self, mut r: Resolution) -> Resolution {
        if r.resource_group.is_none() {
            let name = naming::randomized_group_name(&self.platform.caller.username);
            tracing::debug!("No resource group resolved, will create '{}'", name);
            r.resource_group = Some(name);
        }
        r
    }

    async fn registry_from_app(&self, mut r: Resolution) -> Resolution {
        if !r.mode.builds_image() || r.registry_server.is_some() {
            return r;
        }
        let Some(group) = r.resource_group.as_deref() else {
            return r;
        };

        if let Ok(app) = self.platform.management.show_app(group, &r.app_name).await {
            if let [server] = app.registry_servers.as_slice() {
                tracing::info!("Using registry {} of the existing container app", server);
                r.registry_server = Some(server.clone());
            }
        }
        r
    }

    async fn registry_details(&self, mut r: Resolution) -> Result<Resolution> {
        if !r.mode.builds_image() {
            return Ok(r);
        }

        let Some(server) = r.registry_server.clone() else {
            let group = r.resource_group.clone().unwrap_or_default();
            let name = naming::registry_name(&group, &self.platform.caller.username, &r.app_name);
            r.registry_server = Some(naming::login_server(&name));
            r.registry = Some(RegistryBinding {
                name,
                resource_group: Some(group),
            });
            r.should_create_registry = true;
            return Ok(r);
        };

        if !naming::is_platform_registry(&server) {
            return Err(UpError::Validation(format!(
                "Cannot supply registry {} when building from source. \
                 Only the platform's own registries ({}) are supported.",
                server,
                crate::constants::REGISTRY_DOMAIN_SUFFIX
            )));
        }

        let name = naming::registry_name_from_server(&server);
        let mut resource_group = r
            .registry
            .as_ref()
            .filter(|b| b.name == name)
            .and_then(|b| b.resource_group.clone());
        if !r.has_registry_credentials() {
            tracing::info!(
                "No credential was provided to access the container registry. Trying to look up..."
            );
            let credentials = self
                .platform
                .credentials
                .get_credentials(&name)
                .await
                .map_err(|e| {
                    UpError::RequiredArgumentMissing(format!(
                        "Failed to retrieve credentials for container registry {}: {}. \
                         Please provide the registry username and password",
                        name, e
                    ))
                })?;
            r.registry_username = Some(credentials.username);
            r.registry_password = Some(credentials.password);
            resource_group = Some(credentials.resource_group);
        }
        if resource_group.is_none() {
            resource_group = self.registry_group(&name, r.resource_group.as_deref()).await;
        }

        r.registry = Some(RegistryBinding {
            name,
            resource_group,
        });
        Ok(r)
    }

    /// Group of a registry whose credentials were supplied: the app's
    /// group when the registry lives there, else whatever the credential
    /// store reports. `None` when neither knows.
    async fn registry_group(&self, name: &str, app_group: Option<&str>) -> Option<String> {
        let prober = Prober::new(self.platform.management.as_ref());
        if prober
            .probe(ResourceKind::Registry, Some(name), app_group)
            .await
            .is_present()
        {
            return app_group.map(str::to_string);
        }

        match self.platform.credentials.get_credentials(name).await {
            Ok(credentials) => Some(credentials.resource_group),
            Err(e) => {
                tracing::debug!("Could not find resource group of registry {}: {}", name, e);
                None
            }
        }
    }
}

/// Filter environments by log workspace, then location, and pick the
/// lexicographically first by name.
pub fn pick_environment(
    environments: Vec<EnvironmentRecord>,
    logs_customer_id: Option<&str>,
    location: Option<&str>,
) -> Option<EnvironmentRecord> {
    environments
        .into_iter()
        .filter(|e| match logs_customer_id {
            Some(id) => e.logs_customer_id.as_deref() == Some(id),
            None => true,
        })
        .filter(|e| match location {
            Some(loc) => normalize_location(&e.location) == normalize_location(loc),
            None => true,
        })
        .min_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)))
}

/// `East US` and `eastus` name the same location
fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}
