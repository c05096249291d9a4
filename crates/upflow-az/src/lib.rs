//! Azure adapter for upflow
//!
//! Implements the upflow-core platform traits over the `az` CLI, plus the
//! GitHub contents API for reading a repository's Dockerfile.
//!
//! # Requirements
//!
//! - `az` CLI with the `containerapp` extension must be installed
//! - Authentication is managed through `az login`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upflow_az::AzProvider;
//! use upflow_core::Platform;
//!
//! let provider = Arc::new(AzProvider::new());
//! let caller = provider.caller_identity(None, None).await?;
//! let platform = Platform::from_provider(provider, caller);
//! ```

pub mod az;
pub mod error;
pub mod github;
pub mod provider;

pub use az::Az;
pub use error::{AzError, Result};
pub use github::{GitHubClient, repo_url_to_name};
pub use provider::AzProvider;
