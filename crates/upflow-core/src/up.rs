//! The `up` entry point

use crate::action::UpReport;
use crate::error::Result;
use crate::orchestrator::{Deployment, Orchestrator};
use crate::provider::Platform;
use crate::report::UpSummary;
use crate::request::UpRequest;
use crate::resolver::Resolver;

#[derive(Debug, Clone)]
pub struct UpOutcome {
    pub summary: UpSummary,
    pub report: UpReport,
    pub deployment: Deployment,
}

/// Validate, resolve, create what is missing and report
pub async fn up(platform: &Platform, request: &UpRequest) -> Result<UpOutcome> {
    request.validate()?;

    let resolution = Resolver::new(platform).resolve(request).await?;
    tracing::debug!(
        resource_group = ?resolution.resource_group,
        environment = ?resolution.environment,
        registry = ?resolution.registry,
        "Resolved deployment"
    );

    let mut deployment = Deployment::bind(platform, &resolution, request).await;
    let report = Orchestrator::new(platform)
        .run(&mut deployment, request)
        .await?;

    let summary = UpSummary::collect(platform, &deployment.app).await;
    Ok(UpOutcome {
        summary,
        report,
        deployment,
    })
}
