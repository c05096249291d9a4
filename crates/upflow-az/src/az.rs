//! az CLI wrapper
//!
//! Runs `az` with JSON output and decodes what it prints.

use crate::error::{AzError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;
use upflow_core::provider::{
    AppRecord, EnvironmentRecord, RegistryRecord, ResourceGroupRecord, ServicePrincipal,
    WorkflowRecord,
};

const NOT_FOUND_MARKERS: &[&str] = &[
    "ResourceNotFound",
    "ResourceGroupNotFound",
    "could not be found",
    "was not found",
    "does not exist",
];

/// az CLI wrapper
pub struct Az {
    program: String,
}

impl Default for Az {
    fn default() -> Self {
        Self::new()
    }
}

impl Az {
    pub fn new() -> Self {
        Self {
            program: "az".to_string(),
        }
    }

    /// Check that az is installed and logged in
    pub async fn check_auth(&self) -> Result<AzAccount> {
        let which = Command::new("which").arg(&self.program).output().await?;
        if !which.status.success() {
            return Err(AzError::AzNotFound);
        }
        self.account_show().await
    }

    /// Run an az command and return stdout
    pub async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.arg("--output").arg("json");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, redact(args).join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an az command and decode its JSON output
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.run_command(args).await?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Like [`Az::run_json`], reading empty output as an empty list
    pub async fn run_list<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>> {
        let output = self.run_command(args).await?;
        if output.trim().is_empty() || output.trim() == "[]" {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&output)?)
    }

    pub async fn account_show(&self) -> Result<AzAccount> {
        self.run_json(&["account", "show"]).await
    }
}

/// Map az's stderr to an error kind
pub fn classify_failure(stderr: &str) -> AzError {
    let message = stderr.trim().to_string();
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        AzError::NotFound(message)
    } else if stderr.contains("az login") {
        AzError::NotLoggedIn(message)
    } else {
        AzError::CommandFailed(message)
    }
}

/// Hide secret values in logged arguments
fn redact<'a>(args: &[&'a str]) -> Vec<&'a str> {
    const SECRET_FLAGS: &[&str] = &[
        "--token",
        "--registry-password",
        "--service-principal-client-secret",
        "--logs-workspace-key",
    ];

    let mut out = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        out.push(if hide_next { "***" } else { arg });
        hide_next = SECRET_FLAGS.contains(arg);
    }
    out
}

/// `az account show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzAccount {
    pub id: String,
    pub user: AzUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzUser {
    pub name: String,
}

/// `az group show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzResourceGroup {
    pub name: String,
    pub location: String,
}

impl From<AzResourceGroup> for ResourceGroupRecord {
    fn from(g: AzResourceGroup) -> Self {
        Self {
            name: g.name,
            location: g.location,
        }
    }
}

/// `az containerapp env show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzManagedEnvironment {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: AzEnvironmentProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzEnvironmentProperties {
    pub provisioning_state: Option<String>,
    pub app_logs_configuration: Option<AzLogsConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzLogsConfiguration {
    pub log_analytics_configuration: Option<AzLogAnalytics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzLogAnalytics {
    pub customer_id: Option<String>,
}

impl AzManagedEnvironment {
    pub fn is_provisioned(&self) -> bool {
        self.properties
            .provisioning_state
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("Succeeded"))
    }
}

impl From<AzManagedEnvironment> for EnvironmentRecord {
    fn from(e: AzManagedEnvironment) -> Self {
        let logs_customer_id = e
            .properties
            .app_logs_configuration
            .and_then(|c| c.log_analytics_configuration)
            .and_then(|l| l.customer_id);
        Self {
            id: e.id,
            name: e.name,
            location: e.location,
            logs_customer_id,
            provisioning_state: e.properties.provisioning_state,
        }
    }
}

/// `az containerapp show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzContainerApp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: AzAppProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzAppProperties {
    pub managed_environment_id: Option<String>,
    pub environment_id: Option<String>,
    pub configuration: Option<AzAppConfiguration>,
    pub template: Option<AzAppTemplate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzAppConfiguration {
    pub ingress: Option<AzIngress>,
    #[serde(default)]
    pub registries: Option<Vec<AzRegistryLogin>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzIngress {
    pub fqdn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzRegistryLogin {
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzAppTemplate {
    #[serde(default)]
    pub containers: Vec<AzContainer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzContainer {
    pub image: Option<String>,
}

impl From<AzContainerApp> for AppRecord {
    fn from(a: AzContainerApp) -> Self {
        let properties = a.properties;
        let configuration = properties.configuration;
        Self {
            id: a.id,
            name: a.name,
            environment_id: properties
                .managed_environment_id
                .or(properties.environment_id),
            image: properties
                .template
                .and_then(|t| t.containers.into_iter().find_map(|c| c.image)),
            fqdn: configuration
                .as_ref()
                .and_then(|c| c.ingress.as_ref())
                .and_then(|i| i.fqdn.clone()),
            registry_servers: configuration
                .and_then(|c| c.registries)
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.server)
                .collect(),
        }
    }
}

/// `az acr show`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzRegistry {
    pub name: String,
    pub login_server: String,
    pub resource_group: Option<String>,
    pub provisioning_state: Option<String>,
}

impl AzRegistry {
    pub fn is_provisioned(&self) -> bool {
        self.provisioning_state
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("Succeeded"))
    }
}

impl From<AzRegistry> for RegistryRecord {
    fn from(r: AzRegistry) -> Self {
        Self {
            name: r.name,
            login_server: r.login_server,
        }
    }
}

/// `az acr credential show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzRegistryCredential {
    pub username: String,
    #[serde(default)]
    pub passwords: Vec<AzPassword>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzPassword {
    pub name: Option<String>,
    pub value: String,
}

/// `az acr build`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzBuildRun {
    pub run_id: Option<String>,
    pub status: Option<String>,
}

/// `az ad sp create-for-rbac`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzServicePrincipal {
    pub app_id: String,
    pub password: String,
    pub tenant: String,
    pub display_name: Option<String>,
}

impl From<AzServicePrincipal> for ServicePrincipal {
    fn from(sp: AzServicePrincipal) -> Self {
        Self {
            app_id: sp.app_id,
            password: sp.password,
            tenant_id: sp.tenant,
        }
    }
}

/// `az containerapp github-action show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzGitHubAction {
    #[serde(default)]
    pub properties: Option<AzGitHubActionProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzGitHubActionProperties {
    pub repo_url: Option<String>,
    pub branch: Option<String>,
}

impl From<AzGitHubAction> for WorkflowRecord {
    fn from(a: AzGitHubAction) -> Self {
        let (repo_url, branch) = a
            .properties
            .map(|p| (p.repo_url, p.branch))
            .unwrap_or_default();
        Self { repo_url, branch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure("ERROR: (ResourceGroupNotFound) Resource group 'x' could not be found."),
            AzError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure("ERROR: Please run 'az login' to setup account."),
            AzError::NotLoggedIn(_)
        ));
        assert!(matches!(
            classify_failure("ERROR: quota exceeded"),
            AzError::CommandFailed(_)
        ));
    }

    #[test]
    fn test_redact_secrets() {
        let args = ["containerapp", "github-action", "add", "--token", "ghp_x", "-n", "web"];
        assert_eq!(
            redact(&args),
            vec!["containerapp", "github-action", "add", "--token", "***", "-n", "web"]
        );
    }

    #[test]
    fn test_container_app_record() {
        let json = r#"{
            "id": "/subscriptions/0000/resourceGroups/web-rg/providers/Microsoft.App/containerApps/web",
            "name": "web",
            "properties": {
                "managedEnvironmentId": "/subscriptions/0000/resourceGroups/web-rg/providers/Microsoft.App/managedEnvironments/web-env",
                "configuration": {
                    "ingress": { "fqdn": "web.nicefield.eastus.azurecontainerapps.io" },
                    "registries": [ { "server": "webacr.azurecr.io" } ]
                },
                "template": { "containers": [ { "image": "webacr.azurecr.io/web:1" } ] }
            }
        }"#;
        let app: AzContainerApp = serde_json::from_str(json).unwrap();
        let record = AppRecord::from(app);

        assert_eq!(record.resource_group().as_deref(), Some("web-rg"));
        assert_eq!(record.image.as_deref(), Some("webacr.azurecr.io/web:1"));
        assert_eq!(record.registry_servers, vec!["webacr.azurecr.io"]);
        assert!(record.environment_id.unwrap().ends_with("/web-env"));
    }

    #[test]
    fn test_environment_record() {
        let json = r#"{
            "id": "/subscriptions/0000/resourceGroups/shared-rg/providers/Microsoft.App/managedEnvironments/shared-env",
            "name": "shared-env",
            "location": "East US",
            "properties": {
                "provisioningState": "Succeeded",
                "appLogsConfiguration": {
                    "logAnalyticsConfiguration": { "customerId": "cust1" }
                }
            }
        }"#;
        let env: AzManagedEnvironment = serde_json::from_str(json).unwrap();
        assert!(env.is_provisioned());

        let record = EnvironmentRecord::from(env);
        assert_eq!(record.logs_customer_id.as_deref(), Some("cust1"));
        assert_eq!(record.resource_group().as_deref(), Some("shared-rg"));
    }
}
