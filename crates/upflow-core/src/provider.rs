//! Control-plane collaborator traits
//!
//! The core never talks to the platform directly. Everything it needs is
//! expressed here as async traits; `upflow-az` implements them over the
//! `az` CLI, and tests implement them in memory.

use crate::constants::DEFAULT_LOCATION;
use crate::error::PlatformResult;
use crate::request::Ingress;
use crate::resource_id::ResourceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// show / list / create operations per resource kind
#[async_trait]
pub trait ManagementClient: Send + Sync {
    async fn show_resource_group(&self, name: &str) -> PlatformResult<ResourceGroupRecord>;

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> PlatformResult<ResourceGroupRecord>;

    async fn show_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<EnvironmentRecord>;

    /// List environments in a group, or across the subscription when `None`
    async fn list_environments(
        &self,
        resource_group: Option<&str>,
    ) -> PlatformResult<Vec<EnvironmentRecord>>;

    async fn create_environment(&self, spec: &EnvironmentSpec)
    -> PlatformResult<EnvironmentRecord>;

    async fn show_app(&self, resource_group: &str, name: &str) -> PlatformResult<AppRecord>;

    /// List apps in a group, or across the subscription when `None`
    async fn list_apps(&self, resource_group: Option<&str>) -> PlatformResult<Vec<AppRecord>>;

    /// Create the app, or update it in place when it already exists
    async fn create_or_update_app(&self, spec: &AppSpec) -> PlatformResult<AppRecord>;

    async fn show_registry(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<RegistryRecord>;

    async fn create_registry(&self, spec: &RegistrySpec) -> PlatformResult<RegistryRecord>;

    /// CI workflow attached to an app
    async fn show_workflow(&self, resource_group: &str, app: &str)
    -> PlatformResult<WorkflowRecord>;

    async fn create_or_update_workflow(&self, spec: &WorkflowSpec)
    -> PlatformResult<WorkflowRecord>;
}

/// Stored credentials of platform registries
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_credentials(&self, registry_name: &str) -> PlatformResult<RegistryCredentials>;
}

/// Remote image builds
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn queue_build(&self, request: &BuildRequest) -> PlatformResult<BuildResult>;
}

/// File contents of a source-control repository
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Returns `None` when the file does not exist at that ref
    async fn get_file(
        &self,
        repo_url: &str,
        git_ref: &str,
        path: &str,
        token: Option<&str>,
    ) -> PlatformResult<Option<Vec<u8>>>;
}

/// Service principals used by CI workflows
#[async_trait]
pub trait ServicePrincipalIssuer: Send + Sync {
    async fn create_service_principal(
        &self,
        scopes: &[String],
        role: &str,
    ) -> PlatformResult<ServicePrincipal>;
}

/// Who is calling, and where new resources go by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub subscription_id: String,
    pub username: String,
    pub default_location: String,
}

impl CallerIdentity {
    pub fn new(subscription_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            username: username.into(),
            default_location: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = location.into();
        self
    }

    /// The given location, or the caller's default
    pub fn location_or(&self, location: Option<&str>) -> String {
        location
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.default_location)
            .to_string()
    }
}

/// Bundle of collaborators handed to the resolver and the orchestrator
#[derive(Clone)]
pub struct Platform {
    pub management: Arc<dyn ManagementClient>,
    pub credentials: Arc<dyn CredentialStore>,
    pub builds: Arc<dyn BuildService>,
    pub source_control: Arc<dyn SourceControl>,
    pub principals: Arc<dyn ServicePrincipalIssuer>,
    pub caller: CallerIdentity,
}

impl Platform {
    /// Build from a single provider implementing every collaborator
    pub fn from_provider<P>(provider: Arc<P>, caller: CallerIdentity) -> Self
    where
        P: ManagementClient
            + CredentialStore
            + BuildService
            + SourceControl
            + ServicePrincipalIssuer
            + 'static,
    {
        Self {
            management: provider.clone(),
            credentials: provider.clone(),
            builds: provider.clone(),
            source_control: provider.clone(),
            principals: provider,
            caller,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupRecord {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub id: String,
    pub name: String,
    pub location: String,

    /// Customer id of the linked log workspace
    pub logs_customer_id: Option<String>,

    pub provisioning_state: Option<String>,
}

impl EnvironmentRecord {
    pub fn resource_group(&self) -> Option<String> {
        ResourceId::parse(&self.id).map(|id| id.resource_group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: String,
    pub name: String,

    /// Fully-qualified id of the hosting environment
    pub environment_id: Option<String>,

    pub image: Option<String>,

    /// Ingress host name, without scheme
    pub fqdn: Option<String>,

    /// Registry servers the app pulls from
    pub registry_servers: Vec<String>,
}

impl AppRecord {
    pub fn resource_group(&self) -> Option<String> {
        ResourceId::parse(&self.id).map(|id| id.resource_group)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub name: String,
    pub login_server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,

    /// Group the registry lives in
    pub resource_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePrincipal {
    pub app_id: String,
    pub password: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub repo_url: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub logs_customer_id: Option<String>,
    pub logs_key: Option<String>,
}

/// Registry login handed to the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryLogin {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Desired configuration of an app; sent on every upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
    pub name: String,
    pub resource_group: String,
    pub environment_id: String,
    pub image: String,
    pub target_port: Option<u16>,
    pub ingress: Option<Ingress>,
    pub env_vars: BTreeMap<String, String>,
    pub registry: Option<RegistryLogin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub name: String,
    pub resource_group: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Group of the registry; `None` leaves the lookup to the build service
    pub resource_group: Option<String>,
    pub registry_name: String,

    /// Repository and tag inside the registry
    pub image_name: String,

    pub source: PathBuf,

    /// Dockerfile name; `None` lets the build service generate one
    pub dockerfile: Option<String>,

    /// Port the generated Dockerfile binds to
    pub target_port: Option<u16>,

    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub run_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub app_name: String,
    pub resource_group: String,
    pub repo_url: String,
    pub branch: String,
    pub token: Option<String>,
    pub registry_server: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    pub image: Option<String>,
    pub context_path: Option<String>,
    /// `None` keeps the principal the existing workflow was wired with
    pub service_principal: Option<ServicePrincipal>,
}
