use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use upflow_core::provider::{
    AppRecord, AppSpec, BuildRequest, BuildResult, EnvironmentRecord, EnvironmentSpec,
    RegistryCredentials, RegistryRecord, RegistrySpec, ResourceGroupRecord, ServicePrincipal,
    WorkflowRecord, WorkflowSpec,
};
use upflow_core::{
    BuildService, CallerIdentity, CredentialStore, ManagementClient, Platform, PlatformError,
    PlatformResult, ServicePrincipalIssuer, SourceControl,
};

pub const SUBSCRIPTION: &str = "0000";

#[derive(Debug, Default)]
pub struct Cloud {
    pub groups: Vec<ResourceGroupRecord>,
    pub environments: Vec<EnvironmentRecord>,
    pub apps: Vec<AppRecord>,
    pub registries: Vec<(String, RegistryRecord)>,
    pub credentials: BTreeMap<String, RegistryCredentials>,
    pub workflows: BTreeMap<(String, String), WorkflowRecord>,
    pub repo_files: BTreeMap<String, String>,

    pub builds: Vec<BuildRequest>,
    pub app_specs: Vec<AppSpec>,
    pub workflow_specs: Vec<WorkflowSpec>,
    pub principal_scopes: Vec<Vec<String>>,

    pub group_creates: usize,
    pub environment_creates: usize,
    pub registry_creates: usize,

    pub fail_listing: bool,
    /// Every show call fails with a non-not-found error
    pub fail_show: bool,
}

/// In-memory platform
#[derive(Default)]
pub struct FakePlatform {
    pub cloud: Mutex<Cloud>,
}

pub fn environment_id(group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.App/managedEnvironments/{}",
        SUBSCRIPTION, group, name
    )
}

pub fn app_id(group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.App/containerApps/{}",
        SUBSCRIPTION, group, name
    )
}

fn not_found(what: &str) -> PlatformError {
    PlatformError::NotFound(what.to_string())
}

fn check_show(cloud: &Cloud) -> PlatformResult<()> {
    if cloud.fail_show {
        return Err(PlatformError::Timeout("management endpoint timed out".into()));
    }
    Ok(())
}

fn group_of(id: &str) -> Option<String> {
    upflow_core::ResourceId::parse(id).map(|id| id.resource_group)
}

#[allow(dead_code)]
impl FakePlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn platform(self: &Arc<Self>) -> Platform {
        Platform::from_provider(
            self.clone(),
            CallerIdentity::new(SUBSCRIPTION, "dev@example.com"),
        )
    }

    pub fn with_group(&self, name: &str, location: &str) {
        self.cloud.lock().unwrap().groups.push(ResourceGroupRecord {
            name: name.to_string(),
            location: location.to_string(),
        });
    }

    pub fn with_environment(&self, group: &str, name: &str, location: &str, logs: Option<&str>) {
        self.with_group(group, location);
        self.cloud.lock().unwrap().environments.push(EnvironmentRecord {
            id: environment_id(group, name),
            name: name.to_string(),
            location: location.to_string(),
            logs_customer_id: logs.map(str::to_string),
            provisioning_state: Some("Succeeded".to_string()),
        });
    }

    pub fn with_app(&self, group: &str, name: &str, environment: &str, registries: &[&str]) {
        self.cloud.lock().unwrap().apps.push(AppRecord {
            id: app_id(group, name),
            name: name.to_string(),
            environment_id: Some(environment_id(group, environment)),
            image: Some("nginx:latest".to_string()),
            fqdn: Some(format!("{}.example.io", name)),
            registry_servers: registries.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub fn with_registry(&self, group: &str, name: &str) {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.registries.push((
            group.to_string(),
            RegistryRecord {
                name: name.to_string(),
                login_server: format!("{}.azurecr.io", name),
            },
        ));
        cloud.credentials.insert(
            name.to_string(),
            RegistryCredentials {
                username: name.to_string(),
                password: "s3cret".to_string(),
                resource_group: group.to_string(),
            },
        );
    }

    pub fn with_repo_file(&self, path: &str, content: &str) {
        self.cloud
            .lock()
            .unwrap()
            .repo_files
            .insert(path.to_string(), content.to_string());
    }

    pub fn with_workflow(&self, group: &str, app: &str) {
        self.cloud.lock().unwrap().workflows.insert(
            (group.to_lowercase(), app.to_string()),
            WorkflowRecord {
                repo_url: None,
                branch: None,
            },
        );
    }
}

#[async_trait]
impl ManagementClient for FakePlatform {
    async fn show_resource_group(&self, name: &str) -> PlatformResult<ResourceGroupRecord> {
        let cloud = self.cloud.lock().unwrap();
        check_show(&cloud)?;
        cloud
            .groups
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> PlatformResult<ResourceGroupRecord> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.group_creates += 1;
        let record = ResourceGroupRecord {
            name: name.to_string(),
            location: location.to_string(),
        };
        cloud.groups.push(record.clone());
        Ok(record)
    }

    async fn show_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<EnvironmentRecord> {
        let cloud = self.cloud.lock().unwrap();
        check_show(&cloud)?;
        cloud
            .environments
            .iter()
            .find(|e| {
                e.name == name
                    && group_of(&e.id).is_some_and(|g| g.eq_ignore_ascii_case(resource_group))
            })
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn list_environments(
        &self,
        resource_group: Option<&str>,
    ) -> PlatformResult<Vec<EnvironmentRecord>> {
        let cloud = self.cloud.lock().unwrap();
        if cloud.fail_listing {
            return Err(PlatformError::Api("listing unavailable".into()));
        }
        Ok(cloud
            .environments
            .iter()
            .filter(|e| match resource_group {
                Some(rg) => group_of(&e.id).is_some_and(|g| g.eq_ignore_ascii_case(rg)),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_environment(
        &self,
        spec: &EnvironmentSpec,
    ) -> PlatformResult<EnvironmentRecord> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.environment_creates += 1;
        let record = EnvironmentRecord {
            id: environment_id(&spec.resource_group, &spec.name),
            name: spec.name.clone(),
            location: spec.location.clone(),
            logs_customer_id: spec.logs_customer_id.clone(),
            provisioning_state: Some("Succeeded".to_string()),
        };
        cloud.environments.push(record.clone());
        Ok(record)
    }

    async fn show_app(&self, resource_group: &str, name: &str) -> PlatformResult<AppRecord> {
        let cloud = self.cloud.lock().unwrap();
        check_show(&cloud)?;
        cloud
            .apps
            .iter()
            .find(|a| {
                a.name == name
                    && group_of(&a.id).is_some_and(|g| g.eq_ignore_ascii_case(resource_group))
            })
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn list_apps(&self, resource_group: Option<&str>) -> PlatformResult<Vec<AppRecord>> {
        let cloud = self.cloud.lock().unwrap();
        if cloud.fail_listing {
            return Err(PlatformError::Api("listing unavailable".into()));
        }
        Ok(cloud
            .apps
            .iter()
            .filter(|a| match resource_group {
                Some(rg) => group_of(&a.id).is_some_and(|g| g.eq_ignore_ascii_case(rg)),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn create_or_update_app(&self, spec: &AppSpec) -> PlatformResult<AppRecord> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.app_specs.push(spec.clone());
        let id = app_id(&spec.resource_group, &spec.name);
        let record = AppRecord {
            id: id.clone(),
            name: spec.name.clone(),
            environment_id: Some(spec.environment_id.clone()),
            image: Some(spec.image.clone()),
            fqdn: spec
                .ingress
                .map(|_| format!("{}.example.io", spec.name)),
            registry_servers: spec.registry.iter().map(|r| r.server.clone()).collect(),
        };
        cloud.apps.retain(|a| !a.id.eq_ignore_ascii_case(&id));
        cloud.apps.push(record.clone());
        Ok(record)
    }

    async fn show_registry(
        &self,
        resource_group: &str,
        name: &str,
    ) -> PlatformResult<RegistryRecord> {
        let cloud = self.cloud.lock().unwrap();
        check_show(&cloud)?;
        cloud
            .registries
            .iter()
            .find(|(g, r)| g.eq_ignore_ascii_case(resource_group) && r.name == name)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| not_found(name))
    }

    async fn create_registry(&self, spec: &RegistrySpec) -> PlatformResult<RegistryRecord> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.registry_creates += 1;
        let record = RegistryRecord {
            name: spec.name.clone(),
            login_server: format!("{}.azurecr.io", spec.name),
        };
        cloud
            .registries
            .push((spec.resource_group.clone(), record.clone()));
        cloud.credentials.insert(
            spec.name.clone(),
            RegistryCredentials {
                username: spec.name.clone(),
                password: "s3cret".to_string(),
                resource_group: spec.resource_group.clone(),
            },
        );
        Ok(record)
    }

    async fn show_workflow(
        &self,
        resource_group: &str,
        app: &str,
    ) -> PlatformResult<WorkflowRecord> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .workflows
            .get(&(resource_group.to_lowercase(), app.to_string()))
            .cloned()
            .ok_or_else(|| not_found(app))
    }

    async fn create_or_update_workflow(
        &self,
        spec: &WorkflowSpec,
    ) -> PlatformResult<WorkflowRecord> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.workflow_specs.push(spec.clone());
        let record = WorkflowRecord {
            repo_url: Some(spec.repo_url.clone()),
            branch: Some(spec.branch.clone()),
        };
        cloud.workflows.insert(
            (spec.resource_group.to_lowercase(), spec.app_name.clone()),
            record.clone(),
        );
        Ok(record)
    }
}

#[async_trait]
impl CredentialStore for FakePlatform {
    async fn get_credentials(&self, registry_name: &str) -> PlatformResult<RegistryCredentials> {
        let cloud = self.cloud.lock().unwrap();
        cloud
            .credentials
            .get(registry_name)
            .cloned()
            .ok_or_else(|| not_found(registry_name))
    }
}

#[async_trait]
impl BuildService for FakePlatform {
    async fn queue_build(&self, request: &BuildRequest) -> PlatformResult<BuildResult> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.builds.push(request.clone());
        Ok(BuildResult {
            run_id: Some(format!("run{}", cloud.builds.len())),
            status: Some("Succeeded".to_string()),
        })
    }
}

#[async_trait]
impl SourceControl for FakePlatform {
    async fn get_file(
        &self,
        _repo_url: &str,
        _git_ref: &str,
        path: &str,
        _token: Option<&str>,
    ) -> PlatformResult<Option<Vec<u8>>> {
        let cloud = self.cloud.lock().unwrap();
        Ok(cloud.repo_files.get(path).map(|c| c.as_bytes().to_vec()))
    }
}

#[async_trait]
impl ServicePrincipalIssuer for FakePlatform {
    async fn create_service_principal(
        &self,
        scopes: &[String],
        _role: &str,
    ) -> PlatformResult<ServicePrincipal> {
        let mut cloud = self.cloud.lock().unwrap();
        cloud.principal_scopes.push(scopes.to_vec());
        Ok(ServicePrincipal {
            app_id: "sp-app".to_string(),
            password: "sp-pass".to_string(),
            tenant_id: "sp-tenant".to_string(),
        })
    }
}
