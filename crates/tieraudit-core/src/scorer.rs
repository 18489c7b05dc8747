//! Deterministic finding scorer.
//!
//! A pure penalty table over findings: no I/O, no hidden state. The same
//! input always yields the same `{status, score}`, and adding findings can
//! only lower the score (clamped to 0).

use serde::{Deserialize, Serialize};

use crate::domain::{AuditStatus, Finding, ScoreOutcome, Severity};

/// Per-severity score deductions for one category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PenaltyWeights {
    pub error: u32,
    pub warning: u32,
    pub info: u32,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            error: 20,
            warning: 10,
            info: 2,
        }
    }
}

/// Weights for a category. Structural categories penalize errors harder
/// since a single architectural violation taints everything built on it.
pub fn penalty_weights(category: &str) -> PenaltyWeights {
    match category {
        "architecture" | "structure" => PenaltyWeights {
            error: 30,
            ..PenaltyWeights::default()
        },
        _ => PenaltyWeights::default(),
    }
}

/// Score findings for a category, deriving status by the shared rule.
///
/// Score starts at 100 and each finding deducts its severity's weight,
/// clamped to `0..=100`. Zero findings score 100/Pass.
pub fn score(category: &str, findings: &[Finding]) -> ScoreOutcome {
    score_with_weights(findings, penalty_weights(category))
}

/// Score findings with explicit weights.
pub fn score_with_weights(findings: &[Finding], weights: PenaltyWeights) -> ScoreOutcome {
    let penalty: u32 = findings
        .iter()
        .map(|f| match f.severity {
            Severity::Error => weights.error,
            Severity::Warning => weights.warning,
            Severity::Info => weights.info,
        })
        .sum();

    ScoreOutcome {
        status: AuditStatus::derive(findings),
        score: 100u32.saturating_sub(penalty) as u8,
    }
}
