//! Explicit workspace root.
//!
//! Every component that touches the filesystem or spawns a process takes a
//! [`WorkspaceRoot`] instead of reading the current directory ad hoc, so
//! tests can point the whole pipeline at a temp directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::tier::Tier;

/// Root of the project being audited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory where scanners drop their per-category JSON artifacts.
    pub fn reports_dir(&self) -> PathBuf {
        self.0.join(".tieraudit").join("reports")
    }

    /// Artifact path for one audit category.
    pub fn artifact_path(&self, category: &str) -> PathBuf {
        self.reports_dir().join(format!("{category}.json"))
    }

    /// Directory holding rendered audit reports.
    pub fn audits_dir(&self) -> PathBuf {
        self.0.join(".tieraudit").join("audits")
    }

    /// Baseline snapshot path for one (tier, identifier, feature) key.
    pub fn baseline_path(&self, tier: Tier, identifier: &str, feature_name: &str) -> PathBuf {
        self.0
            .join(".tieraudit")
            .join("baselines")
            .join(feature_name)
            .join(format!("{}-{}.json", tier.name(), identifier))
    }
}

impl From<PathBuf> for WorkspaceRoot {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}
