//! Existence prober

use crate::provider::ManagementClient;
use std::fmt;

/// Kind of resource the prober can look up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    ResourceGroup,
    Environment,
    Registry,
    App,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::ResourceGroup => write!(f, "resource group"),
            ResourceKind::Environment => write!(f, "environment"),
            ResourceKind::Registry => write!(f, "container registry"),
            ResourceKind::App => write!(f, "container app"),
        }
    }
}

/// Result of an existence probe
///
/// `TransientError` is kept apart from `NotFound` so callers can report it,
/// even though both read as absent when defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Present,
    NotFound,
    TransientError(String),
}

impl ProbeOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

/// Asks the management client whether a resource exists.
///
/// Never fails: a missing identity reads as `NotFound` without a platform
/// call, and any failure other than not-found becomes `TransientError`.
pub struct Prober<'a> {
    management: &'a dyn ManagementClient,
}

impl<'a> Prober<'a> {
    pub fn new(management: &'a dyn ManagementClient) -> Self {
        Self { management }
    }

    pub async fn probe(
        &self,
        kind: ResourceKind,
        name: Option<&str>,
        resource_group: Option<&str>,
    ) -> ProbeOutcome {
        let Some(name) = non_empty(name) else {
            return ProbeOutcome::NotFound;
        };

        let result = match (kind, non_empty(resource_group)) {
            (ResourceKind::ResourceGroup, _) => {
                self.management.show_resource_group(name).await.map(|_| ())
            }
            (_, None) => return ProbeOutcome::NotFound,
            (ResourceKind::Environment, Some(group)) => self
                .management
                .show_environment(group, name)
                .await
                .map(|_| ()),
            (ResourceKind::Registry, Some(group)) => {
                self.management.show_registry(group, name).await.map(|_| ())
            }
            (ResourceKind::App, Some(group)) => {
                self.management.show_app(group, name).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => ProbeOutcome::Present,
            Err(e) if e.is_not_found() => ProbeOutcome::NotFound,
            Err(e) => {
                tracing::warn!(
                    "Could not determine whether {} '{}' exists, treating it as absent: {}",
                    kind,
                    name,
                    e
                );
                ProbeOutcome::TransientError(e.to_string())
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlatformError, PlatformResult};
    use crate::provider::{
        AppRecord, AppSpec, EnvironmentRecord, EnvironmentSpec, RegistryRecord, RegistrySpec,
        ResourceGroupRecord, WorkflowRecord, WorkflowSpec,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Answer {
        Present,
        NotFound,
        Failing,
    }

    /// Answers every show call the same way and counts them
    struct ShowOnly {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl ShowOnly {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn show<T>(&self, name: &str, record: impl FnOnce() -> T) -> PlatformResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Answer::Present => Ok(record()),
                Answer::NotFound => Err(PlatformError::NotFound(name.to_string())),
                Answer::Failing => Err(PlatformError::Api("throttled".to_string())),
            }
        }
    }

    #[async_trait]
    impl ManagementClient for ShowOnly {
        async fn show_resource_group(&self, name: &str) -> PlatformResult<ResourceGroupRecord> {
            self.show(name, || ResourceGroupRecord {
                name: name.to_string(),
                location: "eastus".to_string(),
            })
        }

        async fn create_resource_group(
            &self,
            _name: &str,
            _location: &str,
        ) -> PlatformResult<ResourceGroupRecord> {
            unreachable!("the prober never creates")
        }

        async fn show_environment(
            &self,
            _resource_group: &str,
            name: &str,
        ) -> PlatformResult<EnvironmentRecord> {
            self.show(name, || EnvironmentRecord {
                id: String::new(),
                name: name.to_string(),
                location: "eastus".to_string(),
                logs_customer_id: None,
                provisioning_state: None,
            })
        }

        async fn list_environments(
            &self,
            _resource_group: Option<&str>,
        ) -> PlatformResult<Vec<EnvironmentRecord>> {
            unreachable!("the prober never lists")
        }

        async fn create_environment(
            &self,
            _spec: &EnvironmentSpec,
        ) -> PlatformResult<EnvironmentRecord> {
            unreachable!("the prober never creates")
        }

        async fn show_app(&self, _resource_group: &str, name: &str) -> PlatformResult<AppRecord> {
            self.show(name, || AppRecord {
                id: String::new(),
                name: name.to_string(),
                environment_id: None,
                image: None,
                fqdn: None,
                registry_servers: Vec::new(),
            })
        }

        async fn list_apps(&self, _resource_group: Option<&str>) -> PlatformResult<Vec<AppRecord>> {
            unreachable!("the prober never lists")
        }

        async fn create_or_update_app(&self, _spec: &AppSpec) -> PlatformResult<AppRecord> {
            unreachable!("the prober never creates")
        }

        async fn show_registry(
            &self,
            _resource_group: &str,
            name: &str,
        ) -> PlatformResult<RegistryRecord> {
            self.show(name, || RegistryRecord {
                name: name.to_string(),
                login_server: format!("{}.azurecr.io", name),
            })
        }

        async fn create_registry(&self, _spec: &RegistrySpec) -> PlatformResult<RegistryRecord> {
            unreachable!("the prober never creates")
        }

        async fn show_workflow(
            &self,
            _resource_group: &str,
            _app: &str,
        ) -> PlatformResult<WorkflowRecord> {
            unreachable!("workflows are not probed")
        }

        async fn create_or_update_workflow(
            &self,
            _spec: &WorkflowSpec,
        ) -> PlatformResult<WorkflowRecord> {
            unreachable!("the prober never creates")
        }
    }

    #[tokio::test]
    async fn test_present_and_not_found() {
        let client = ShowOnly::new(Answer::Present);
        let prober = Prober::new(&client);
        let outcome = prober
            .probe(ResourceKind::App, Some("web"), Some("web-rg"))
            .await;
        assert_eq!(outcome, ProbeOutcome::Present);

        let client = ShowOnly::new(Answer::NotFound);
        let prober = Prober::new(&client);
        let outcome = prober
            .probe(ResourceKind::Environment, Some("web-env"), Some("web-rg"))
            .await;
        assert_eq!(outcome, ProbeOutcome::NotFound);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_are_transient() {
        let client = ShowOnly::new(Answer::Failing);
        let prober = Prober::new(&client);

        for kind in [
            ResourceKind::ResourceGroup,
            ResourceKind::Environment,
            ResourceKind::Registry,
            ResourceKind::App,
        ] {
            let outcome = prober.probe(kind, Some("web"), Some("web-rg")).await;
            assert!(
                matches!(outcome, ProbeOutcome::TransientError(ref msg) if msg.contains("throttled")),
                "{kind}: {outcome:?}"
            );
            assert!(!outcome.is_present());
        }
        assert_eq!(client.calls(), 4);
    }

    #[tokio::test]
    async fn test_missing_name_skips_the_platform() {
        let client = ShowOnly::new(Answer::Present);
        let prober = Prober::new(&client);

        let unnamed = prober.probe(ResourceKind::App, None, Some("web-rg")).await;
        let empty = prober
            .probe(ResourceKind::ResourceGroup, Some(""), None)
            .await;
        assert_eq!(unnamed, ProbeOutcome::NotFound);
        assert_eq!(empty, ProbeOutcome::NotFound);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_group_skips_the_platform() {
        let client = ShowOnly::new(Answer::Present);
        let prober = Prober::new(&client);

        for kind in [
            ResourceKind::Environment,
            ResourceKind::Registry,
            ResourceKind::App,
        ] {
            assert_eq!(
                prober.probe(kind, Some("web"), None).await,
                ProbeOutcome::NotFound
            );
            assert_eq!(
                prober.probe(kind, Some("web"), Some("")).await,
                ProbeOutcome::NotFound
            );
        }
        assert_eq!(client.calls(), 0);

        // groups need no parent group
        assert!(
            prober
                .probe(ResourceKind::ResourceGroup, Some("web-rg"), None)
                .await
                .is_present()
        );
        assert_eq!(client.calls(), 1);
    }
}
