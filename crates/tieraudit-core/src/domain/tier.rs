//! The four nested audit scopes.
//!
//! `Feature` is the broadest scope and `Task` the narrowest. The ordering is
//! strict: the autofix cascade only ever walks downward via [`Tier::child`],
//! which is what guarantees cascade termination independently of any depth
//! counter.

use serde::{Deserialize, Serialize};

/// An audit scope in the tier hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Feature,
    Phase,
    Session,
    Task,
}

impl Tier {
    /// Tier name as used in report filenames and baseline keys.
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Feature => "feature",
            Tier::Phase => "phase",
            Tier::Session => "session",
            Tier::Task => "task",
        }
    }

    /// Capitalized tier name for human-facing output (commit messages, reports).
    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Feature => "Feature",
            Tier::Phase => "Phase",
            Tier::Session => "Session",
            Tier::Task => "Task",
        }
    }

    /// The next-narrower tier, or `None` at the bottom of the hierarchy.
    pub fn child(&self) -> Option<Tier> {
        match self {
            Tier::Feature => Some(Tier::Phase),
            Tier::Phase => Some(Tier::Session),
            Tier::Session => Some(Tier::Task),
            Tier::Task => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, thiserror::Error)]
#[error("unknown tier: {0} (expected feature, phase, session, or task)")]
pub struct ParseTierError(String);

impl std::str::FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "feature" => Ok(Tier::Feature),
            "phase" => Ok(Tier::Phase),
            "session" => Ok(Tier::Session),
            "task" => Ok(Tier::Task),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}
