//! Existence state of a resource descriptor
//!
//! Every descriptor carries an [`Existence`]. It only moves through a probe
//! (`observe`) or a successful creation (`created`), so a resource that was
//! seen as present can only become absent again by probing it afresh.

use crate::probe::ProbeOutcome;
use serde::{Deserialize, Serialize};

/// Tri-state existence of a resource on the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Existence {
    /// Never probed
    #[default]
    Unknown,
    /// Last probe did not find the resource (or could not tell)
    Absent,
    /// Last probe found the resource, or we created it
    Present,
}

impl Existence {
    /// Transition after a probe
    pub fn observe(self, outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Present => Existence::Present,
            ProbeOutcome::NotFound | ProbeOutcome::TransientError(_) => Existence::Absent,
        }
    }

    /// Transition after a successful create call
    pub fn created(self) -> Self {
        Existence::Present
    }

    pub fn is_present(self) -> bool {
        self == Existence::Present
    }
}

impl std::fmt::Display for Existence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Existence::Unknown => write!(f, "unknown"),
            Existence::Absent => write!(f, "absent"),
            Existence::Present => write!(f, "present"),
        }
    }
}
