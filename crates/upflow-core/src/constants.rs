//! Platform constants shared by the resolver, the orchestrator and the adapters

use std::time::Duration;

/// Poll interval for quick status checks
pub const SHORT_POLLING_INTERVAL: Duration = Duration::from_secs(3);

/// Poll interval for long-running provisioning
pub const LONG_POLLING_INTERVAL: Duration = Duration::from_secs(10);

/// Host suffix of the platform's own container registries
pub const REGISTRY_DOMAIN_SUFFIX: &str = ".azurecr.io";

pub const CONTAINER_APPS_NAMESPACE: &str = "Microsoft.App";
pub const ENVIRONMENT_RESOURCE_TYPE: &str = "managedEnvironments";

pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";
pub const DEFAULT_BRANCH: &str = "main";

/// Port the auto-build pipeline binds to when the source has no Dockerfile
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_LOCATION: &str = "eastus";

/// Image used for the first revision of an app wired to a repository
pub const HELLO_WORLD_IMAGE: &str = "mcr.microsoft.com/azuredocs/containerapps-helloworld:latest";

pub const MAXIMUM_CONTAINER_APP_NAME_LENGTH: usize = 32;
pub const MAXIMUM_REGISTRY_NAME_LENGTH: usize = 50;

/// Hex characters of the SHA-256 digest appended to synthesized registry names
pub const REGISTRY_HASH_LENGTH: usize = 12;

pub const CONTRIBUTOR_ROLE: &str = "contributor";
