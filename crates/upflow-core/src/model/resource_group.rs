use crate::action::ActionType;
use crate::error::Result;
use crate::naming;
use crate::probe::{Prober, ResourceKind};
use crate::provider::{Platform, ResourceGroupRecord};
use crate::state::Existence;

/// Resource group descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    name: Option<String>,
    location: String,
    state: Existence,
}

impl ResourceGroup {
    pub fn new(name: Option<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            location: location.into(),
            state: Existence::Unknown,
        }
    }

    /// Construct and probe in one go
    pub async fn bind(
        name: Option<String>,
        location: impl Into<String>,
        prober: &Prober<'_>,
    ) -> Self {
        let mut group = Self::new(name, location);
        group.probe(prober).await;
        group
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> Existence {
        self.state
    }

    pub fn exists(&self) -> bool {
        self.state.is_present()
    }

    /// Same group, compared the way the platform compares group names
    pub fn is_same_group(&self, other: &ResourceGroup) -> bool {
        match (self.name(), other.name()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }

    pub async fn probe(&mut self, prober: &Prober<'_>) -> Existence {
        let outcome = prober
            .probe(ResourceKind::ResourceGroup, self.name(), None)
            .await;
        self.state = self.state.observe(&outcome);
        self.state
    }

    /// Create the group, picking a randomized name if it has none yet
    pub async fn create(&mut self, platform: &Platform) -> Result<ResourceGroupRecord> {
        let name = match &self.name {
            Some(n) => n.clone(),
            None => {
                let n = naming::randomized_group_name(&platform.caller.username);
                self.name = Some(n.clone());
                n
            }
        };

        let record = platform
            .management
            .create_resource_group(&name, &self.location)
            .await?;
        self.state = self.state.created();
        Ok(record)
    }

    pub async fn create_if_needed(&mut self, platform: &Platform) -> Result<ActionType> {
        let prober = Prober::new(platform.management.as_ref());
        if self.probe(&prober).await.is_present() {
            tracing::info!("Using resource group '{}'", self.name().unwrap_or_default());
            return Ok(ActionType::Reuse);
        }

        self.create(platform).await?;
        tracing::info!(
            "Created resource group '{}' in {}",
            self.name().unwrap_or_default(),
            self.location
        );
        Ok(ActionType::Create)
    }
}
