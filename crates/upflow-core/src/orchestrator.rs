//! Creation orchestrator
//!
//! Creates whatever is missing, strictly in dependency order:
//! resource group → environment → registry → image → app → CI workflow.
//! Each step re-probes right before it creates.

use crate::action::UpReport;
use crate::constants::{DEFAULT_PORT, HELLO_WORLD_IMAGE};
use crate::dockerfile;
use crate::error::{Result, UpError};
use crate::model::{ContainerApp, Environment, Registry, ResourceGroup};
use crate::naming;
use crate::probe::{Prober, ResourceKind};
use crate::provider::Platform;
use crate::request::{DeployMode, Ingress, UpRequest};
use crate::resolver::Resolution;
use crate::workflow;
use std::time::Instant;

/// Descriptors for one `up` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub environment: Environment,
    pub app: ContainerApp,
}

impl Deployment {
    /// Build descriptors from a finished resolution and probe them
    pub async fn bind(platform: &Platform, resolution: &Resolution, request: &UpRequest) -> Self {
        let prober = Prober::new(platform.management.as_ref());
        let location = platform.caller.location_or(resolution.location.as_deref());

        let group =
            ResourceGroup::bind(resolution.resource_group.clone(), location.clone(), &prober).await;

        let mut environment =
            Environment::new(resolution.environment.as_deref(), group.clone(), location.clone())
                .with_logs(request.logs_customer_id.clone(), request.logs_key.clone());
        if !environment.resource_group().is_same_group(&group) {
            environment.resource_group_mut().probe(&prober).await;
        }
        environment.probe(&prober).await;

        let mut app = ContainerApp::new(resolution.app_name.clone(), group);
        app.image = resolution.image.clone();
        app.target_port = request.target_port;
        app.ingress = request.ingress;
        app.env_vars = request.env_vars.clone();
        app.registry_server = resolution.registry_server.clone();
        app.registry_username = resolution.registry_username.clone();
        app.registry_password = resolution.registry_password.clone();
        app.should_create_registry = resolution.should_create_registry;
        app.registry = resolution.registry.as_ref().map(|binding| {
            Registry::new(
                binding.name.clone(),
                ResourceGroup::new(binding.resource_group.clone(), location.clone()),
            )
        });
        app.probe(&prober).await;

        Self { environment, app }
    }
}

pub struct Orchestrator<'a> {
    platform: &'a Platform,
}

impl<'a> Orchestrator<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self { platform }
    }

    pub async fn run(&self, deployment: &mut Deployment, request: &UpRequest) -> Result<UpReport> {
        let start = Instant::now();
        let mut report = UpReport::new();
        let Deployment { environment, app } = deployment;

        // 1. resource groups
        let action = app.resource_group_mut().create_if_needed(self.platform).await?;
        report.record(
            ResourceKind::ResourceGroup,
            app.resource_group().name().unwrap_or_default(),
            None,
            action,
        );
        environment.adopt_group(app.resource_group());
        if !environment.resource_group().is_same_group(app.resource_group()) {
            let action = environment
                .resource_group_mut()
                .create_if_needed(self.platform)
                .await?;
            report.record(
                ResourceKind::ResourceGroup,
                environment.resource_group().name().unwrap_or_default(),
                None,
                action,
            );
        }

        // 2. environment
        let action = environment
            .create_if_needed(self.platform, app.name())
            .await?;
        report.record(
            ResourceKind::Environment,
            environment.name().unwrap_or_default(),
            environment.resource_group().name(),
            action,
        );

        // 3. registry
        if let Some(action) = app.create_registry_if_needed(self.platform).await? {
            if let Some(registry) = &app.registry {
                report.record(
                    ResourceKind::Registry,
                    registry.name(),
                    registry.resource_group().name(),
                    action,
                );
            }
        }

        // 4. image
        self.acquire_image(app, request).await?;

        // 5. app
        let (action, _) = app.create(self.platform, environment).await?;
        report.record(
            ResourceKind::App,
            app.name(),
            app.resource_group().name(),
            action,
        );

        // 6. CI workflow
        if request.mode() == DeployMode::Repo {
            workflow::wire(self.platform, app, environment, request).await?;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Settle ingress and port, and produce the image the app will run
    async fn acquire_image(&self, app: &mut ContainerApp, request: &UpRequest) -> Result<()> {
        match request.mode() {
            DeployMode::Image => {
                self.apply_dockerfile(app, None);
            }
            DeployMode::Source => {
                let source = request.source.as_deref().ok_or_else(|| {
                    UpError::RequiredArgumentMissing("No source directory given".to_string())
                })?;
                let content = dockerfile::read_local(source, request.dockerfile_name()).await?;
                self.apply_dockerfile(app, content.as_deref());

                if content.is_none() && app.target_port.is_none() {
                    tracing::info!(
                        "No Dockerfile found in {}, building with the default port {}",
                        source.display(),
                        DEFAULT_PORT
                    );
                    app.target_port = Some(DEFAULT_PORT);
                    app.ingress.get_or_insert(Ingress::External);
                }

                let tag = naming::build_tag(&chrono::Local::now());
                let dockerfile_name = content.as_ref().map(|_| request.dockerfile_name());
                app.run_build(self.platform, source, dockerfile_name, &tag)
                    .await?;
            }
            DeployMode::Repo => {
                let repo = request.repo.as_deref().ok_or_else(|| {
                    UpError::RequiredArgumentMissing("No repository given".to_string())
                })?;
                let content = dockerfile::fetch_from_repo(
                    self.platform.source_control.as_ref(),
                    repo,
                    request.branch_name(),
                    request.token.as_deref(),
                    request.context_path.as_deref(),
                    request.dockerfile_name(),
                )
                .await?;
                self.apply_dockerfile(app, content.as_deref());

                if app.image.is_none() {
                    let current = app.get(self.platform).await.and_then(|r| r.image);
                    app.image = Some(current.unwrap_or_else(|| HELLO_WORLD_IMAGE.to_string()));
                }
            }
        }
        Ok(())
    }

    fn apply_dockerfile(&self, app: &mut ContainerApp, content: Option<&str>) {
        let (ingress, port) =
            dockerfile::infer_ingress_and_port(app.ingress, app.target_port, content);
        app.ingress = ingress;
        app.target_port = port;
    }
}
