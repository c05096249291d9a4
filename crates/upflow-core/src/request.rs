//! User input for `up`

use crate::constants::{DEFAULT_BRANCH, DEFAULT_DOCKERFILE, MAXIMUM_CONTAINER_APP_NAME_LENGTH};
use crate::error::{Result, UpError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Inbound exposure of an app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ingress {
    External,
    Internal,
}

impl FromStr for Ingress {
    type Err = UpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "external" => Ok(Ingress::External),
            "internal" => Ok(Ingress::Internal),
            other => Err(UpError::InvalidArgumentValue(format!(
                "Invalid ingress '{}'. Expected 'external' or 'internal'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Ingress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ingress::External => write!(f, "external"),
            Ingress::Internal => write!(f, "internal"),
        }
    }
}

/// Where the app's image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// A pre-built image reference
    Image,
    /// A local source directory built remotely
    Source,
    /// A source-control repository built by a CI workflow
    Repo,
}

impl DeployMode {
    pub fn builds_image(self) -> bool {
        matches!(self, DeployMode::Source | DeployMode::Repo)
    }
}

/// Raw arguments of `up`
#[derive(Debug, Clone, Default)]
pub struct UpRequest {
    pub name: String,
    pub resource_group: Option<String>,

    /// Environment name or fully-qualified id
    pub environment: Option<String>,

    pub location: Option<String>,
    pub image: Option<String>,
    pub source: Option<PathBuf>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub token: Option<String>,
    pub context_path: Option<String>,
    pub dockerfile: Option<String>,
    pub registry_server: Option<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
    pub target_port: Option<u16>,
    pub ingress: Option<Ingress>,
    pub env_vars: BTreeMap<String, String>,
    pub logs_customer_id: Option<String>,
    pub logs_key: Option<String>,
    pub service_principal_client_id: Option<String>,
    pub service_principal_client_secret: Option<String>,
    pub service_principal_tenant_id: Option<String>,
}

impl UpRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check the request before any resource is looked up
    pub fn validate(&self) -> Result<()> {
        validate_sources(
            self.source.is_some(),
            self.image.is_some(),
            self.repo.is_some(),
        )?;

        if self.name.trim().is_empty() {
            return Err(UpError::RequiredArgumentMissing(
                "Please specify the container app name with --name".to_string(),
            ));
        }

        if self.name.len() > MAXIMUM_CONTAINER_APP_NAME_LENGTH {
            return Err(UpError::InvalidArgumentValue(format!(
                "Container app name '{}' is longer than {} characters",
                self.name, MAXIMUM_CONTAINER_APP_NAME_LENGTH
            )));
        }

        if self.repo.is_some() && self.token.is_none() {
            return Err(UpError::RequiredArgumentMissing(
                "A GitHub token is required when deploying from a repository (--token)"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Source wins over repo, repo over image
    pub fn mode(&self) -> DeployMode {
        if self.source.is_some() {
            DeployMode::Source
        } else if self.repo.is_some() {
            DeployMode::Repo
        } else {
            DeployMode::Image
        }
    }

    pub fn dockerfile_name(&self) -> &str {
        self.dockerfile
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DOCKERFILE)
    }

    pub fn branch_name(&self) -> &str {
        self.branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Image as the app will reference it.
    ///
    /// When building from source, a supplied image only names the build
    /// output, so it is reduced to its last path segment without `:`.
    pub fn reformatted_image(&self) -> Option<String> {
        let image = self.image.as_deref()?;
        if self.source.is_some() {
            let last = image.rsplit('/').next().unwrap_or(image);
            Some(last.replace(':', ""))
        } else {
            Some(image.to_string())
        }
    }
}

/// Exactly one of source, image, repo drives the image; source and repo
/// cannot be combined.
pub fn validate_sources(source: bool, image: bool, repo: bool) -> Result<()> {
    if !source && !image && !repo {
        return Err(UpError::RequiredArgumentMissing(
            "You must specify either --source, --repo, or --image".to_string(),
        ));
    }
    if source && repo {
        return Err(UpError::MutuallyExclusiveArguments(
            "Cannot use --source and --repo together. \
             Can either deploy from a local directory or a GitHub repository"
                .to_string(),
        ));
    }
    Ok(())
}

/// Parse `KEY=VALUE` pairs. Keys must be unique.
pub fn parse_env_vars<S: AsRef<str>>(items: &[S]) -> Result<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    for item in items {
        let item = item.as_ref();
        let (key, value) = item.split_once('=').ok_or_else(|| {
            UpError::InvalidArgumentValue(format!(
                "Environment variable '{}' must be in KEY=VALUE form",
                item
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(UpError::InvalidArgumentValue(format!(
                "Environment variable '{}' has an empty name",
                item
            )));
        }
        if vars.insert(key.to_string(), value.to_string()).is_some() {
            return Err(UpError::InvalidArgumentValue(format!(
                "Environment variable '{}' is set more than once",
                key
            )));
        }
    }
    Ok(vars)
}
