use super::ResourceGroup;
use crate::action::ActionType;
use crate::constants::{CONTAINER_APPS_NAMESPACE, ENVIRONMENT_RESOURCE_TYPE};
use crate::error::{Result, UpError};
use crate::naming;
use crate::probe::{Prober, ResourceKind};
use crate::provider::{EnvironmentRecord, EnvironmentSpec, Platform};
use crate::resource_id::ResourceId;
use crate::state::Existence;

/// Managed environment descriptor
///
/// The name may be given as a fully-qualified id. The group embedded in an
/// id wins over the group the environment was bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    name: Option<String>,
    location: String,
    resource_group: ResourceGroup,
    logs_customer_id: Option<String>,
    logs_key: Option<String>,
    state: Existence,
}

impl Environment {
    pub fn new(
        name_or_id: Option<&str>,
        resource_group: ResourceGroup,
        location: impl Into<String>,
    ) -> Self {
        let mut env = Self {
            name: None,
            location: location.into(),
            resource_group,
            logs_customer_id: None,
            logs_key: None,
            state: Existence::Unknown,
        };
        if let Some(n) = name_or_id.filter(|n| !n.is_empty()) {
            env.set_name(n);
        }
        env
    }

    /// Link the environment to a log workspace
    pub fn with_logs(mut self, customer_id: Option<String>, key: Option<String>) -> Self {
        self.logs_customer_id = customer_id;
        self.logs_key = key;
        self
    }

    /// Rename from a plain name or a fully-qualified id.
    ///
    /// An id whose group differs from the bound group re-binds the
    /// environment to a new, unprobed group.
    pub fn set_name(&mut self, name_or_id: &str) {
        match ResourceId::parse(name_or_id) {
            Some(id) => {
                let same_group = self
                    .resource_group
                    .name()
                    .is_some_and(|g| g.eq_ignore_ascii_case(&id.resource_group));
                if !same_group {
                    self.resource_group =
                        ResourceGroup::new(Some(id.resource_group), self.location.clone());
                }
                self.name = Some(id.name);
            }
            None => self.name = Some(name_or_id.to_string()),
        }
        self.state = Existence::Unknown;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn resource_group(&self) -> &ResourceGroup {
        &self.resource_group
    }

    pub fn resource_group_mut(&mut self) -> &mut ResourceGroup {
        &mut self.resource_group
    }

    /// Share the app's group descriptor when both live in the same group
    pub fn adopt_group(&mut self, group: &ResourceGroup) {
        if self.resource_group.is_same_group(group) {
            self.resource_group = group.clone();
        }
    }

    pub fn logs_customer_id(&self) -> Option<&str> {
        self.logs_customer_id.as_deref()
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
                ResourceKind::Environment,
                self.name(),
                self.resource_group.name(),
            )
            .await;
        self.state = self.state.observe(&outcome);
        self.state
    }

    /// Fully-qualified id, if the environment is named and grouped
    pub fn resource_id(&self, subscription: &str) -> Option<String> {
        let name = self.name()?;
        let group = self.resource_group.name()?;
        Some(
            ResourceId::new(
                subscription,
                group,
                CONTAINER_APPS_NAMESPACE,
                ENVIRONMENT_RESOURCE_TYPE,
                name,
            )
            .to_string(),
        )
    }

    /// Create the environment, naming it after the app if it has no name
    pub async fn create(
        &mut self,
        platform: &Platform,
        app_name: &str,
    ) -> Result<EnvironmentRecord> {
        let name = match &self.name {
            Some(n) => n.clone(),
            None => {
                let n = naming::environment_name(app_name);
                self.name = Some(n.clone());
                n
            }
        };
        let resource_group = self.resource_group.name().ok_or_else(|| {
            UpError::Validation(format!(
                "Cannot create environment '{}' without a resource group",
                name
            ))
        })?;

        let spec = EnvironmentSpec {
            name,
            resource_group: resource_group.to_string(),
            location: self.location.clone(),
            logs_customer_id: self.logs_customer_id.clone(),
            logs_key: self.logs_key.clone(),
        };
        let record = platform.management.create_environment(&spec).await?;
        self.state = self.state.created();
        Ok(record)
    }

    pub async fn create_if_needed(
        &mut self,
        platform: &Platform,
        app_name: &str,
    ) -> Result<ActionType> {
        let prober = Prober::new(platform.management.as_ref());
        if self.probe(&prober).await.is_present() {
            tracing::info!(
                "Using environment '{}' in resource group '{}'",
                self.name().unwrap_or_default(),
                self.resource_group.name().unwrap_or_default()
            );
            return Ok(ActionType::Reuse);
        }

        self.create(platform, app_name).await?;
        tracing::info!(
            "Created environment '{}' in resource group '{}'",
            self.name().unwrap_or_default(),
            self.resource_group.name().unwrap_or_default()
        );
        Ok(ActionType::Create)
    }
}
