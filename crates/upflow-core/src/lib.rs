//! Upflow core
//!
//! Turns a minimal `up` request into a running container app: resolves
//! whatever the user left out from what already exists on the platform,
//! then creates the missing pieces in dependency order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  UpRequest   │──▶│   Resolver   │──▶│ Orchestrator │──▶│  UpSummary   │
//! │  (validate)  │   │  (pipeline)  │   │   (create)   │   │   (report)   │
//! └──────────────┘   └──────┬───────┘   └──────┬───────┘   └──────────────┘
//!                           │                  │
//!                    ┌──────▼──────────────────▼──────┐
//!                    │    Platform (async traits)     │
//!                    │ management / credentials /     │
//!                    │ builds / source control / SPs  │
//!                    └────────────────────────────────┘
//! ```

pub mod action;
pub mod constants;
pub mod dockerfile;
pub mod error;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod probe;
pub mod provider;
pub mod report;
pub mod request;
pub mod resolver;
pub mod resource_id;
pub mod state;
pub mod up;
pub mod workflow;

// Re-exports
pub use action::{Action, ActionType, ReportSummary, UpReport};
pub use error::{PlatformError, PlatformResult, Result, UpError};
pub use model::{ContainerApp, Environment, Registry, ResourceGroup};
pub use orchestrator::{Deployment, Orchestrator};
pub use probe::{ProbeOutcome, Prober, ResourceKind};
pub use provider::{
    BuildService, CallerIdentity, CredentialStore, ManagementClient, Platform,
    ServicePrincipalIssuer, SourceControl,
};
pub use report::UpSummary;
pub use request::{DeployMode, Ingress, UpRequest};
pub use resolver::{Resolution, Resolver, Step};
pub use resource_id::ResourceId;
pub use state::Existence;
pub use up::{UpOutcome, up};
