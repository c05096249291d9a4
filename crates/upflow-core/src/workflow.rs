//! Continuous deployment wiring for repository deployments

use crate::constants::CONTRIBUTOR_ROLE;
use crate::error::Result;
use crate::model::{ContainerApp, Environment};
use crate::provider::{Platform, ServicePrincipal, WorkflowRecord, WorkflowSpec};
use crate::request::UpRequest;

/// Principal the workflow deploys with.
///
/// An existing workflow keeps whatever was supplied; otherwise a complete
/// supplied principal is used, and failing that a new one is issued.
pub async fn principal_for(
    platform: &Platform,
    app: &ContainerApp,
    environment: &Environment,
    request: &UpRequest,
) -> Result<Option<ServicePrincipal>> {
    let supplied = supplied_principal(request);
    let app_group = app.resource_group().name().unwrap_or_default();

    if platform
        .management
        .show_workflow(app_group, app.name())
        .await
        .is_ok()
    {
        tracing::debug!("CI workflow for '{}' already exists", app.name());
        return Ok(supplied);
    }
    if supplied.is_some() {
        return Ok(supplied);
    }

    let scopes = principal_scopes(
        &platform.caller.subscription_id,
        app_group,
        environment.resource_group().name(),
    );
    tracing::warn!("No valid service principal provided, creating a new one");
    let principal = platform
        .principals
        .create_service_principal(&scopes, CONTRIBUTOR_ROLE)
        .await?;
    tracing::info!("Created service principal {}", principal.app_id);
    Ok(Some(principal))
}

/// Create or update the CI workflow that builds and deploys the repository
pub async fn wire(
    platform: &Platform,
    app: &ContainerApp,
    environment: &Environment,
    request: &UpRequest,
) -> Result<WorkflowRecord> {
    let service_principal = principal_for(platform, app, environment, request).await?;
    let spec = WorkflowSpec {
        app_name: app.name().to_string(),
        resource_group: app.resource_group().name().unwrap_or_default().to_string(),
        repo_url: request.repo.clone().unwrap_or_default(),
        branch: request.branch_name().to_string(),
        token: request.token.clone(),
        registry_server: app.registry_server.clone(),
        registry_username: app.registry_username.clone(),
        registry_password: app.registry_password.clone(),
        image: app.image.clone(),
        context_path: request.context_path.clone(),
        service_principal,
    };

    tracing::info!(
        "Wiring CI workflow for '{}' to {} ({})",
        spec.app_name,
        spec.repo_url,
        spec.branch
    );
    Ok(platform.management.create_or_update_workflow(&spec).await?)
}

fn supplied_principal(request: &UpRequest) -> Option<ServicePrincipal> {
    match (
        &request.service_principal_client_id,
        &request.service_principal_client_secret,
        &request.service_principal_tenant_id,
    ) {
        (Some(app_id), Some(password), Some(tenant_id)) => Some(ServicePrincipal {
            app_id: app_id.clone(),
            password: password.clone(),
            tenant_id: tenant_id.clone(),
        }),
        _ => None,
    }
}

/// Group scopes a new principal is granted, app group first
pub fn principal_scopes(
    subscription: &str,
    app_group: &str,
    environment_group: Option<&str>,
) -> Vec<String> {
    let mut scopes = vec![format!(
        "/subscriptions/{}/resourceGroups/{}",
        subscription, app_group
    )];
    if let Some(env_group) = environment_group.filter(|g| !g.eq_ignore_ascii_case(app_group)) {
        scopes.push(format!(
            "/subscriptions/{}/resourceGroups/{}",
            subscription, env_group
        ));
    }
    scopes
}
