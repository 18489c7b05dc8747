//! Baseline score snapshots and start/end comparison.
//!
//! One snapshot exists per (tier, identifier, feature) key; a later
//! start-audit replaces it wholesale. Load absence is not an error, and IO
//! failures are surfaced as warnings by callers rather than failing the
//! parent audit.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{AuditError, Result, Tier, WorkspaceRoot};

/// Persisted per-category scores captured at tier-start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineSnapshot {
    pub tier: Tier,
    pub identifier: String,
    pub feature_name: String,
    pub timestamp: DateTime<Utc>,
    pub scores: BTreeMap<String, u8>,
}

/// Direction of a category's score movement between start and end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    Improved,
    Regressed,
    Unchanged,
    /// Category present at end but not in the baseline.
    New,
    /// Category present in the baseline but not at end.
    Missing,
}

/// One category's start/end score comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub category: String,
    pub start_score: Option<u8>,
    pub end_score: Option<u8>,
    pub delta: Option<i16>,
    pub status: ComparisonStatus,
}

/// File-backed baseline store under `<root>/.tieraudit/baselines/`.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    root: WorkspaceRoot,
}

impl BaselineStore {
    pub fn new(root: WorkspaceRoot) -> Self {
        Self { root }
    }

    /// Persist a snapshot, overwriting any prior snapshot for the same key.
    pub fn store(
        &self,
        tier: Tier,
        identifier: &str,
        feature_name: &str,
        scores: BTreeMap<String, u8>,
    ) -> Result<BaselineSnapshot> {
        let snapshot = BaselineSnapshot {
            tier,
            identifier: identifier.to_string(),
            feature_name: feature_name.to_string(),
            timestamp: Utc::now(),
            scores,
        };

        let path = self.root.baseline_path(tier, identifier, feature_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuditError::BaselineStore(format!("create {parent:?}: {e}")))?;
        }
        let content = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, content)
            .map_err(|e| AuditError::BaselineStore(format!("write {path:?}: {e}")))?;

        debug!(path = ?path, "Stored baseline snapshot");
        Ok(snapshot)
    }

    /// Load the snapshot for a key. Absence yields `Ok(None)`.
    pub fn load(
        &self,
        tier: Tier,
        identifier: &str,
        feature_name: &str,
    ) -> Result<Option<BaselineSnapshot>> {
        let path = self.root.baseline_path(tier, identifier, feature_name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuditError::BaselineStore(format!("read {path:?}: {e}")));
            }
        };
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }
}

/// Compare end-of-tier scores against a baseline.
///
/// Every category on either side produces exactly one entry: shared keys get
/// a delta and Improved/Regressed/Unchanged, baseline-only keys are Missing,
/// end-only keys are New. With no baseline every end entry is New.
pub fn compare(
    baseline: Option<&BaselineSnapshot>,
    end_scores: &BTreeMap<String, u8>,
) -> Vec<Comparison> {
    let Some(baseline) = baseline else {
        return end_scores
            .iter()
            .map(|(category, score)| Comparison {
                category: category.clone(),
                start_score: None,
                end_score: Some(*score),
                delta: None,
                status: ComparisonStatus::New,
            })
            .collect();
    };

    let categories: BTreeSet<&String> = baseline.scores.keys().chain(end_scores.keys()).collect();

    categories
        .into_iter()
        .map(|category| {
            let start = baseline.scores.get(category).copied();
            let end = end_scores.get(category).copied();
            match (start, end) {
                (Some(start), Some(end)) => {
                    let delta = i16::from(end) - i16::from(start);
                    let status = match delta {
                        d if d > 0 => ComparisonStatus::Improved,
                        d if d < 0 => ComparisonStatus::Regressed,
                        _ => ComparisonStatus::Unchanged,
                    };
                    Comparison {
                        category: category.clone(),
                        start_score: Some(start),
                        end_score: Some(end),
                        delta: Some(delta),
                        status,
                    }
                }
                (Some(start), None) => Comparison {
                    category: category.clone(),
                    start_score: Some(start),
                    end_score: None,
                    delta: None,
                    status: ComparisonStatus::Missing,
                },
                (None, end) => Comparison {
                    category: category.clone(),
                    start_score: None,
                    end_score: end,
                    delta: None,
                    status: ComparisonStatus::New,
                },
            }
        })
        .collect()
}
