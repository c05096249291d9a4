//! Fully-qualified resource identities
//!
//! `/subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}`

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription: String,
    pub resource_group: String,
    pub namespace: String,
    pub resource_type: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(
        subscription: impl Into<String>,
        resource_group: impl Into<String>,
        namespace: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription: subscription.into(),
            resource_group: resource_group.into(),
            namespace: namespace.into(),
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Parse a resource id. Child resource segments after the name are ignored.
    pub fn parse(id: &str) -> Option<Self> {
        if !id.starts_with('/') {
            return None;
        }

        let segments: Vec<&str> = id.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 8 {
            return None;
        }

        let keyword_ok = segments[0].eq_ignore_ascii_case("subscriptions")
            && segments[2].eq_ignore_ascii_case("resourceGroups")
            && segments[4].eq_ignore_ascii_case("providers");
        if !keyword_ok {
            return None;
        }

        Some(Self::new(
            segments[1],
            segments[3],
            segments[5],
            segments[6],
            segments[7],
        ))
    }

    pub fn is_valid(id: &str) -> bool {
        Self::parse(id).is_some()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            self.subscription, self.resource_group, self.namespace, self.resource_type, self.name
        )
    }
}
