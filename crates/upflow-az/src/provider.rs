//! Azure implementation of the platform collaborators

use crate::az::{
    Az, AzBuildRun, AzContainerApp, AzGitHubAction, AzManagedEnvironment, AzRegistry,
    AzRegistryCredential, AzResourceGroup, AzServicePrincipal,
};
use crate::error::{AzError, Result};
use crate::github::GitHubClient;
use async_trait::async_trait;
use upflow_core::constants::{DEFAULT_LOCATION, LONG_POLLING_INTERVAL, SHORT_POLLING_INTERVAL};
use upflow_core::provider::{
    AppRecord, AppSpec, BuildRequest, BuildResult, EnvironmentRecord, EnvironmentSpec,
    RegistryCredentials, RegistryRecord, RegistrySpec, ResourceGroupRecord, ServicePrincipal,
    WorkflowRecord, WorkflowSpec,
};
use upflow_core::{
    BuildService, CallerIdentity, CredentialStore, ManagementClient, PlatformResult,
    ServicePrincipalIssuer, SourceControl,
};

/// Give up polling after this many rounds
const MAX_POLLS: u32 = 60;

/// Azure provider over the `az` CLI
pub struct AzProvider {
    az: Az,
    github: GitHubClient,
}

impl Default for AzProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AzProvider {
    pub fn new() -> Self {
        Self {
            az: Az::new(),
            github: GitHubClient::new(),
        }
    }

    /// Identify the logged-in caller.
    ///
    /// Configured values win over what the account reports.
    pub async fn caller_identity(
        &self,
        location: Option<String>,
        username: Option<String>,
    ) -> Result<CallerIdentity> {
        let account = self.az.check_auth().await?;
        let username = username.unwrap_or(account.user.name);
        Ok(CallerIdentity::new(account.id, username)
            .with_default_location(location.unwrap_or_else(|| DEFAULT_LOCATION.to_string())))
    }

    async fn wait_for_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<AzManagedEnvironment> {
        for attempt in 1..=MAX_POLLS {
            let env: AzManagedEnvironment = self
                .az
                .run_json(&["containerapp", "env", "show", "-g", resource_group, "-n", name])
                .await?;
            if env.is_provisioned() {
                return Ok(env);
            }
            tracing::debug!(
                "Environment '{}' is {} (poll {})",
                name,
                env.properties.provisioning_state.as_deref().unwrap_or("pending"),
                attempt
            );
            tokio::time::sleep(LONG_POLLING_INTERVAL).await;
        }
        Err(AzError::Timeout(format!("environment '{}'", name)))
    }

    async fn wait_for_registry(&self, resource_group: &str, name: &str) -> Result<AzRegistry> {
        for _ in 1..=MAX_POLLS {
            let registry: AzRegistry = self
                .az
                .run_json(&["acr", "show", "-g", resource_group, "-n", name])
                .await?;
            if registry.is_provisioned() {
                return Ok(registry);
            }
            tokio::time::sleep(SHORT_POLLING_INTERVAL).await;
        }
        Err(AzError::Timeout(format!("container registry '{}'", name)))
    }

    async fn create_app(&self, spec: &AppSpec) -> Result<()> {
        let port = spec.target_port.map(|p| p.to_string());
        let ingress = spec.ingress.map(|i| i.to_string());
        let env_vars = env_var_args(spec);

        let mut args = vec![
            "containerapp",
            "create",
            "-n",
            spec.name.as_str(),
            "-g",
            spec.resource_group.as_str(),
            "--environment",
            spec.environment_id.as_str(),
            "--image",
            spec.image.as_str(),
        ];
        if let Some(port) = &port {
            args.extend(["--target-port", port.as_str()]);
        }
        if let Some(ingress) = &ingress {
            args.extend(["--ingress", ingress.as_str()]);
        }
        if let Some(registry) = &spec.registry {
            args.extend(["--registry-server", registry.server.as_str()]);
            if let Some(username) = &registry.username {
                args.extend(["--registry-username", username.as_str()]);
            }
            if let Some(password) = &registry.password {
                args.extend(["--registry-password", password.as_str()]);
            }
        }
        if !env_vars.is_empty() {
            args.push("--env-vars");
            args.extend(env_vars.iter().map(String::as_str));
        }

        self.az.run_command(&args).await?;
        Ok(())
    }

    async fn update_app(&self, spec: &AppSpec) -> Result<()> {
        let name = spec.name.as_str();
        let group = spec.resource_group.as_str();

        if let Some(registry) = &spec.registry {
            let mut args = vec![
                "containerapp",
                "registry",
                "set",
                "-n",
                name,
                "-g",
                group,
                "--server",
                registry.server.as_str(),
            ];
            if let Some(username) = &registry.username {
                args.extend(["--username", username.as_str()]);
            }
            if let Some(password) = &registry.password {
                args.extend(["--password", password.as_str()]);
            }
            self.az.run_command(&args).await?;
        }

        if let (Some(ingress), Some(port)) = (spec.ingress, spec.target_port) {
            let ingress = ingress.to_string();
            let port = port.to_string();
            self.az
                .run_command(&[
                    "containerapp",
                    "ingress",
                    "enable",
                    "-n",
                    name,
                    "-g",
                    group,
                    "--type",
                    ingress.as_str(),
                    "--target-port",
                    port.as_str(),
                ])
                .await?;
        }

        let env_vars = env_var_args(spec);
        let mut args = vec![
            "containerapp",
            "update",
            "-n",
            name,
            "-g",
            group,
            "--image",
            spec.image.as_str(),
        ];
        if !env_vars.is_empty() {
            args.push("--set-env-vars");
            args.extend(env_vars.iter().map(String::as_str));
        }
        self.az.run_command(&args).await?;
        Ok(())
    }
}

fn env_var_args(spec: &AppSpec) -> Vec<String> {
    spec.env_vars
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect()
}

#[async_trait]
impl ManagementClient for AzProvider {
    async fn show_resource_group(&self, name: &str) -> PlatformResult<ResourceGroupRecord> {
        let group: AzResourceGroup = self.az.run_json(&["group", "show", "-n", name]).await?;
        Ok(group.into())
    }

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> PlatformResult<ResourceGroupRecord> {
        let group: AzResourceGroup = self
            .az
            .run_json(&["group", "create", "-n", name, "-l", location])
            .await?;
        Ok(group.into())
    }

    async fn show_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<EnvironmentRecord> {
        let env: AzManagedEnvironment = self
            .az
            .run_json(&["containerapp", "env", "show", "-g", resource_group, "-n", name])
            .await?;
        Ok(env.into())
    }

    async fn list_environments(
        &self,
        resource_group: Option<&str>,
    ) -> PlatformResult<Vec<EnvironmentRecord>> {
        let mut args = vec!["containerapp", "env", "list"];
        if let Some(rg) = resource_group {
            args.extend(["-g", rg]);
        }
        let envs: Vec<AzManagedEnvironment> = self.az.run_list(&args).await?;
        Ok(envs.into_iter().map(Into::into).collect())
    }

    async fn create_environment(
        &self,
        spec: &EnvironmentSpec,
    ) -> PlatformResult<EnvironmentRecord> {
        let mut args = vec![
            "containerapp",
            "env",
            "create",
            "-n",
            spec.name.as_str(),
            "-g",
            spec.resource_group.as_str(),
            "-l",
            spec.location.as_str(),
            "--no-wait",
        ];
        if let (Some(customer_id), Some(key)) = (&spec.logs_customer_id, &spec.logs_key) {
            args.extend([
                "--logs-workspace-id",
                customer_id.as_str(),
                "--logs-workspace-key",
                key.as_str(),
            ]);
        }
        self.az.run_command(&args).await?;

        let env = self
            .wait_for_environment(&spec.resource_group, &spec.name)
            .await?;
        Ok(env.into())
    }

    async fn show_app(&self, resource_group: &str, name: &str) -> PlatformResult<AppRecord> {
        let app: AzContainerApp = self
            .az
            .run_json(&["containerapp", "show", "-g", resource_group, "-n", name])
            .await?;
        Ok(app.into())
    }

    async fn list_apps(&self, resource_group: Option<&str>) -> PlatformResult<Vec<AppRecord>> {
        let mut args = vec!["containerapp", "list"];
        if let Some(rg) = resource_group {
            args.extend(["-g", rg]);
        }
        let apps: Vec<AzContainerApp> = self.az.run_list(&args).await?;
        Ok(apps.into_iter().map(Into::into).collect())
    }

    async fn create_or_update_app(&self, spec: &AppSpec) -> PlatformResult<AppRecord> {
        match self.show_app(&spec.resource_group, &spec.name).await {
            Ok(_) => self.update_app(spec).await?,
            Err(e) if e.is_not_found() => self.create_app(spec).await?,
            Err(e) => return Err(e),
        }
        self.show_app(&spec.resource_group, &spec.name).await
    }

    async fn show_registry(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<RegistryRecord> {
        let registry: AzRegistry = self
            .az
            .run_json(&["acr", "show", "-g", resource_group, "-n", name])
            .await?;
        Ok(registry.into())
    }

    async fn create_registry(&self, spec: &RegistrySpec) -> PlatformResult<RegistryRecord> {
        self.az
            .run_command(&[
                "acr",
                "create",
                "-n",
                spec.name.as_str(),
                "-g",
                spec.resource_group.as_str(),
                "-l",
                spec.location.as_str(),
                "--sku",
                "Basic",
                "--admin-enabled",
                "true",
            ])
            .await?;
        let registry = self
            .wait_for_registry(&spec.resource_group, &spec.name)
            .await?;
        Ok(registry.into())
    }

    async fn show_workflow(
        &self,
        resource_group: &str,
        app: &str,
    ) -> PlatformResult<WorkflowRecord> {
        let action: AzGitHubAction = self
            .az
            .run_json(&["containerapp", "github-action", "show", "-g", resource_group, "-n", app])
            .await?;
        Ok(action.into())
    }

    async fn create_or_update_workflow(
        &self,
        spec: &WorkflowSpec,
    ) -> PlatformResult<WorkflowRecord> {
        let mut args = vec![
            "containerapp",
            "github-action",
            "add",
            "-n",
            spec.app_name.as_str(),
            "-g",
            spec.resource_group.as_str(),
            "--repo-url",
            spec.repo_url.as_str(),
            "--branch",
            spec.branch.as_str(),
        ];
        let optional = [
            ("--token", &spec.token),
            ("--registry-url", &spec.registry_server),
            ("--registry-username", &spec.registry_username),
            ("--registry-password", &spec.registry_password),
            ("--image", &spec.image),
            ("--context-path", &spec.context_path),
        ];
        for (flag, value) in optional {
            if let Some(value) = value {
                args.extend([flag, value.as_str()]);
            }
        }
        if let Some(sp) = &spec.service_principal {
            args.extend([
                "--service-principal-client-id",
                sp.app_id.as_str(),
                "--service-principal-client-secret",
                sp.password.as_str(),
                "--service-principal-tenant-id",
                sp.tenant_id.as_str(),
            ]);
        }

        let action: AzGitHubAction = self.az.run_json(&args).await?;
        Ok(action.into())
    }
}

#[async_trait]
impl CredentialStore for AzProvider {
    async fn get_credentials(&self, registry_name: &str) -> PlatformResult<RegistryCredentials> {
        let registries: Vec<AzRegistry> = self.az.run_list(&["acr", "list"]).await?;
        let registry = registries
            .into_iter()
            .find(|r| r.name.eq_ignore_ascii_case(registry_name))
            .ok_or_else(|| AzError::NotFound(format!("container registry '{}'", registry_name)))?;

        let credential: AzRegistryCredential = self
            .az
            .run_json(&["acr", "credential", "show", "-n", registry.name.as_str()])
            .await?;
        let password = credential
            .passwords
            .into_iter()
            .next()
            .map(|p| p.value)
            .ok_or_else(|| {
                AzError::CommandFailed(format!(
                    "container registry '{}' has no admin password",
                    registry.name
                ))
            })?;

        Ok(RegistryCredentials {
            username: credential.username,
            password,
            resource_group: registry.resource_group.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl BuildService for AzProvider {
    async fn queue_build(&self, request: &BuildRequest) -> PlatformResult<BuildResult> {
        let source = request.source.to_string_lossy();
        let mut args = vec!["acr", "build", "-r", request.registry_name.as_str()];
        if let Some(resource_group) = &request.resource_group {
            args.extend(["-g", resource_group.as_str()]);
        }
        args.extend(["--image", request.image_name.as_str()]);
        if let Some(dockerfile) = &request.dockerfile {
            args.extend(["--file", dockerfile.as_str()]);
        }
        if request.quiet {
            args.push("--no-logs");
        }
        args.push(source.as_ref());

        let run: AzBuildRun = self.az.run_json(&args).await?;
        if let Some(status) = run.status.as_deref() {
            if !status.eq_ignore_ascii_case("Succeeded") {
                return Err(AzError::CommandFailed(format!(
                    "build of {} finished with status {}",
                    request.image_name, status
                ))
                .into());
            }
        }
        Ok(BuildResult {
            run_id: run.run_id,
            status: run.status,
        })
    }
}

#[async_trait]
impl SourceControl for AzProvider {
    async fn get_file(
        &self,
        repo_url: &str,
        git_ref: &str,
        path: &str,
        token: Option<&str>,
    ) -> PlatformResult<Option<Vec<u8>>> {
        Ok(self.github.get_file(repo_url, git_ref, path, token).await?)
    }
}

#[async_trait]
impl ServicePrincipalIssuer for AzProvider {
    async fn create_service_principal(
        &self,
        scopes: &[String],
        role: &str,
    ) -> PlatformResult<ServicePrincipal> {
        let mut args = vec!["ad", "sp", "create-for-rbac", "--role", role, "--scopes"];
        args.extend(scopes.iter().map(String::as_str));
        let sp: AzServicePrincipal = self.az.run_json(&args).await?;
        if let Some(name) = &sp.display_name {
            tracing::info!("Created service principal: {}", name);
        }
        Ok(sp.into())
    }
}
