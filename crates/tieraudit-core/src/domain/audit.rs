//! Audit result types.
//!
//! Status is always a pure derivation from contained findings; nothing in
//! the pipeline sets `Pass`/`Warn`/`Fail` independently. Results are built
//! fresh per invocation and never mutated downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::finding::{Finding, Severity};
use crate::domain::tier::Tier;

/// Pass/warn/fail status of one category or of a whole tier audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pass,
    Warn,
    Fail,
}

impl AuditStatus {
    /// Derive a status from findings: Fail if any Error, else Warn if any
    /// Warning, else Pass. Identical rule across every category.
    pub fn derive(findings: &[Finding]) -> Self {
        if findings.iter().any(|f| f.severity == Severity::Error) {
            AuditStatus::Fail
        } else if findings.iter().any(|f| f.severity == Severity::Warning) {
            AuditStatus::Warn
        } else {
            AuditStatus::Pass
        }
    }

    /// Fold two statuses, keeping the worse one.
    pub fn combine(self, other: AuditStatus) -> AuditStatus {
        use AuditStatus::*;
        match (self, other) {
            (Fail, _) | (_, Fail) => Fail,
            (Warn, _) | (_, Warn) => Warn,
            (Pass, Pass) => Pass,
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuditStatus::Pass => "pass",
            AuditStatus::Warn => "warn",
            AuditStatus::Fail => "fail",
        };
        f.write_str(s)
    }
}

/// Score and status for one category, as computed by the scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub status: AuditStatus,
    pub score: u8,
}

/// Result of one audit category within a tier audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditResult {
    /// Category name (e.g. "lint", "security").
    pub category: String,

    /// Derived status.
    pub status: AuditStatus,

    /// Penalty-table score, 0..=100.
    pub score: u8,

    /// Normalized findings in scanner emission order.
    pub findings: Vec<Finding>,

    /// Remediation recommendations extracted from findings.
    pub recommendations: Vec<String>,

    /// One-line human-readable summary.
    pub summary: String,
}

impl AuditResult {
    /// Build a result from canonicalized findings and a scorer outcome.
    ///
    /// Recommendations are the deduplicated suggestions carried by the
    /// findings themselves.
    pub fn new(category: impl Into<String>, outcome: ScoreOutcome, findings: Vec<Finding>) -> Self {
        let category = category.into();
        let mut recommendations = Vec::new();
        for finding in &findings {
            if let Some(suggestion) = &finding.suggestion {
                if !recommendations.contains(suggestion) {
                    recommendations.push(suggestion.clone());
                }
            }
        }

        let errors = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        let warnings = findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count();
        let summary = format!(
            "{}: {} (score {}, {} errors, {} warnings, {} findings)",
            category,
            outcome.status,
            outcome.score,
            errors,
            warnings,
            findings.len(),
        );

        Self {
            category,
            status: outcome.status,
            score: outcome.score,
            findings,
            recommendations,
            summary,
        }
    }
}

/// Result of one complete tier audit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierAuditResult {
    /// Unique run identifier.
    pub run_id: Uuid,

    /// Audited tier.
    pub tier: Tier,

    /// Tier identifier (e.g. "3.2" for a phase, a slug for a feature).
    pub identifier: String,

    /// Feature this audit belongs to.
    pub feature_name: String,

    /// Worst status across all category results.
    pub overall_status: AuditStatus,

    /// Per-category results in plan order.
    pub results: Vec<AuditResult>,

    /// When the audit ran.
    pub timestamp: DateTime<Utc>,

    /// Digest of the ordered category plan (deterministic).
    pub plan_digest: String,

    /// Where the end-audit markdown report is written.
    pub report_path: String,

    /// Infrastructure errors captured at category boundaries. These never
    /// affect `overall_status`.
    pub errors: Vec<String>,
}

impl TierAuditResult {
    /// Derive the overall status from per-category results.
    pub fn overall_status_of(results: &[AuditResult]) -> AuditStatus {
        results
            .iter()
            .map(|r| r.status)
            .fold(AuditStatus::Pass, AuditStatus::combine)
    }

    /// Number of categories that passed.
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == AuditStatus::Pass)
            .count()
    }

    /// Number of categories that failed.
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == AuditStatus::Fail)
            .count()
    }

    /// Per-category scores, keyed for baseline storage and comparison.
    pub fn scores(&self) -> std::collections::BTreeMap<String, u8> {
        self.results
            .iter()
            .map(|r| (r.category.clone(), r.score))
            .collect()
    }

    /// All findings across categories, in category-plan then emission order.
    pub fn all_findings(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.results
            .iter()
            .flat_map(|r| r.findings.iter().map(move |f| (r.category.as_str(), f)))
    }
}

/// Compute a deterministic digest of an ordered category plan.
pub fn compute_plan_digest(categories: &[String]) -> String {
    let mut hasher = Sha256::new();
    for category in categories {
        hasher.update(category.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding::new(severity, "something")
    }

    #[test]
    fn test_status_derivation_rule() {
        assert_eq!(AuditStatus::derive(&[]), AuditStatus::Pass);
        assert_eq!(
            AuditStatus::derive(&[finding(Severity::Info)]),
            AuditStatus::Pass
        );
        assert_eq!(
            AuditStatus::derive(&[finding(Severity::Info), finding(Severity::Warning)]),
            AuditStatus::Warn
        );
        assert_eq!(
            AuditStatus::derive(&[
                finding(Severity::Warning),
                finding(Severity::Error),
                finding(Severity::Info)
            ]),
            AuditStatus::Fail
        );
    }

    #[test]
    fn test_status_combine_keeps_worst() {
        assert_eq!(
            AuditStatus::Pass.combine(AuditStatus::Warn),
            AuditStatus::Warn
        );
        assert_eq!(
            AuditStatus::Warn.combine(AuditStatus::Fail),
            AuditStatus::Fail
        );
        assert_eq!(
            AuditStatus::Pass.combine(AuditStatus::Pass),
            AuditStatus::Pass
        );
    }

    #[test]
    fn test_audit_result_collects_recommendations() {
        let findings = vec![
            Finding::new(Severity::Warning, "too complex").with_suggestion("split the function"),
            Finding::new(Severity::Warning, "also complex").with_suggestion("split the function"),
            Finding::new(Severity::Info, "note"),
        ];
        let outcome = ScoreOutcome {
            status: AuditStatus::Warn,
            score: 80,
        };
        let result = AuditResult::new("complexity", outcome, findings);

        assert_eq!(result.recommendations, vec!["split the function"]);
        assert!(result.summary.contains("complexity"));
        assert!(result.summary.contains("80"));
    }

    #[test]
    fn test_overall_status_of() {
        let pass = AuditResult::new(
            "lint",
            ScoreOutcome {
                status: AuditStatus::Pass,
                score: 100,
            },
            vec![],
        );
        let warn = AuditResult::new(
            "coverage",
            ScoreOutcome {
                status: AuditStatus::Warn,
                score: 90,
            },
            vec![finding(Severity::Warning)],
        );

        assert_eq!(
            TierAuditResult::overall_status_of(&[pass.clone()]),
            AuditStatus::Pass
        );
        assert_eq!(
            TierAuditResult::overall_status_of(&[pass, warn]),
            AuditStatus::Warn
        );
    }

    #[test]
    fn test_plan_digest_deterministic_and_order_sensitive() {
        let a = vec!["lint".to_string(), "typecheck".to_string()];
        let b = vec!["lint".to_string(), "typecheck".to_string()];
        let c = vec!["typecheck".to_string(), "lint".to_string()];

        assert_eq!(compute_plan_digest(&a), compute_plan_digest(&b));
        assert_ne!(compute_plan_digest(&a), compute_plan_digest(&c));
    }
}
