//! Audit report rendering.
//!
//! Renders a [`TierAuditResult`] plus its baseline comparison to Markdown
//! with a mirrored JSON artifact, written as
//! `<tier>-<identifier>[-start]-audit.{md,json}` under the workspace's
//! audits directory. Write failures are the caller's warnings, never audit
//! failures.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::{Comparison, ComparisonStatus};
use crate::domain::{TierAuditResult, WorkspaceRoot};

/// Whether a report belongs to a start or end audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditPhase {
    Start,
    End,
}

impl AuditPhase {
    fn file_suffix(&self) -> &'static str {
        match self {
            AuditPhase::Start => "-start",
            AuditPhase::End => "",
        }
    }
}

/// Canonical JSON artifact mirroring the markdown report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub phase: AuditPhase,
    pub audit: TierAuditResult,
    pub comparisons: Vec<Comparison>,
}

/// Paths of the written report pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Render the markdown report body.
pub fn render_markdown(audit: &TierAuditResult, comparisons: &[Comparison]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} Audit: {}\n\n",
        audit.tier.display_name(),
        audit.identifier
    ));
    out.push_str(&format!("- Feature: {}\n", audit.feature_name));
    out.push_str(&format!("- Overall status: **{}**\n", audit.overall_status));
    out.push_str(&format!("- Run: {}\n", audit.run_id));
    out.push_str(&format!(
        "- Timestamp: {}\n\n",
        audit.timestamp.to_rfc3339()
    ));

    out.push_str("## Categories\n\n");
    out.push_str("| Category | Status | Score | Findings |\n");
    out.push_str("|----------|--------|-------|----------|\n");
    for result in &audit.results {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            result.category,
            result.status,
            result.score,
            result.findings.len()
        ));
    }
    out.push('\n');

    for result in &audit.results {
        if result.findings.is_empty() {
            continue;
        }
        out.push_str(&format!("### {}\n\n", result.category));
        for finding in &result.findings {
            let location = finding
                .location
                .as_deref()
                .map(|l| format!(" ({l})"))
                .unwrap_or_default();
            out.push_str(&format!(
                "- {:?}: {}{}\n",
                finding.severity, finding.message, location
            ));
        }
        if !result.recommendations.is_empty() {
            out.push_str("\nRecommendations:\n");
            for rec in &result.recommendations {
                out.push_str(&format!("- {rec}\n"));
            }
        }
        out.push('\n');
    }

    if !comparisons.is_empty() {
        out.push_str("## Baseline Comparison\n\n");
        out.push_str("| Category | Start | End | Delta | Status |\n");
        out.push_str("|----------|-------|-----|-------|--------|\n");
        for c in comparisons {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                c.category,
                c.start_score.map_or("-".to_string(), |s| s.to_string()),
                c.end_score.map_or("-".to_string(), |s| s.to_string()),
                c.delta.map_or("-".to_string(), |d| format!("{d:+}")),
                comparison_status_label(c.status),
            ));
        }
        out.push('\n');
    }

    if !audit.errors.is_empty() {
        out.push_str("## Infrastructure Warnings\n\n");
        for error in &audit.errors {
            out.push_str(&format!("- {error}\n"));
        }
        out.push('\n');
    }

    out
}

fn comparison_status_label(status: ComparisonStatus) -> &'static str {
    match status {
        ComparisonStatus::Improved => "improved",
        ComparisonStatus::Regressed => "regressed",
        ComparisonStatus::Unchanged => "unchanged",
        ComparisonStatus::New => "new",
        ComparisonStatus::Missing => "missing",
    }
}

/// Write the markdown report and its mirrored JSON artifact.
pub fn write_reports(
    root: &WorkspaceRoot,
    audit: &TierAuditResult,
    comparisons: &[Comparison],
    phase: AuditPhase,
) -> Result<ReportPaths> {
    let dir = root.audits_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("create {dir:?}"))?;

    let stem = format!(
        "{}-{}{}-audit",
        audit.tier.name(),
        audit.identifier,
        phase.file_suffix()
    );
    let markdown_path = dir.join(format!("{stem}.md"));
    let json_path = dir.join(format!("{stem}.json"));

    let markdown = render_markdown(audit, comparisons);
    std::fs::write(&markdown_path, markdown)
        .with_context(|| format!("write {markdown_path:?}"))?;

    let artifact = AuditReportArtifact {
        schema_version: "1".to_string(),
        generated_at: Utc::now(),
        phase,
        audit: audit.clone(),
        comparisons: comparisons.to_vec(),
    };
    let content = serde_json::to_string_pretty(&artifact).context("serialize audit artifact")?;
    std::fs::write(&json_path, content).with_context(|| format!("write {json_path:?}"))?;

    Ok(ReportPaths {
        markdown: markdown_path,
        json: json_path,
    })
}
