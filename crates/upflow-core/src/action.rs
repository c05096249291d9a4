//! Record of what the orchestrator did to each resource

use crate::probe::ResourceKind;
use serde::{Deserialize, Serialize};

/// What happened to a resource during `up`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// The resource did not exist and was created
    Create,
    /// The resource existed and was updated in place
    Update,
    /// The resource existed and was used as is
    Reuse,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Reuse => write!(f, "reuse"),
        }
    }
}

/// A single step taken by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ResourceKind,
    pub name: String,
    pub resource_group: Option<String>,
    pub action_type: ActionType,
}

/// Ordered list of actions taken during one orchestrator run
#[derive(Debug, Clone, Default)]
pub struct UpReport {
    pub actions: Vec<Action>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl UpReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        kind: ResourceKind,
        name: impl Into<String>,
        resource_group: Option<&str>,
        action_type: ActionType,
    ) {
        self.actions.push(Action {
            kind,
            name: name.into(),
            resource_group: resource_group.map(str::to_string),
            action_type,
        });
    }

    /// Actions of one type, in execution order
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            reuse: self.actions_by_type(ActionType::Reuse).len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub create: usize,
    pub update: usize,
    pub reuse: usize,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} reused",
            self.create, self.update, self.reuse
        )
    }
}
