//! Resource descriptors
//!
//! In-memory view of each resource `up` needs: its desired identity and
//! whether it exists on the platform.

mod app;
mod environment;
mod registry;
mod resource_group;

pub use app::ContainerApp;
pub use environment::Environment;
pub use registry::Registry;
pub use resource_group::ResourceGroup;
