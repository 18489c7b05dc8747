//! Typed model of per-category scanner artifacts.
//!
//! Scanners are opaque JSON producers; this module is the validation
//! boundary that turns whatever they dropped on disk into typed [`Finding`]s.
//! Absent and malformed artifacts are both valid inputs that degrade to a
//! single Info finding; they never fail an audit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Finding, Severity};

/// Coverage below this percentage is flagged.
const COVERAGE_WARN_THRESHOLD: f64 = 80.0;

/// Per-file scores below this are flagged.
const LOW_FILE_SCORE: f64 = 50.0;

/// Per-file complexity scores at or above this are flagged.
const HIGH_COMPLEXITY_SCORE: f64 = 15.0;

/// Duplicate groups spanning at least this many files are flagged.
const LARGE_GROUP_FILES: u64 = 3;

/// One per-category JSON artifact as written by a scanner.
///
/// Every field is optional; scanners populate whichever sections apply to
/// their category. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanArtifact {
    pub files: Vec<FileReport>,
    pub errors: Vec<ErrorEntry>,
    pub pools: Vec<PoolReport>,
    pub groups: Vec<GroupReport>,
    pub summary: Option<ScanSummary>,
    pub issues: Vec<IssueReport>,
    pub categories: Vec<CategoryReport>,
}

/// A scanner error entry: either a bare message or a detailed record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorEntry {
    Text(String),
    Detailed {
        message: String,
        #[serde(default)]
        file: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FileReport {
    pub repo_path: String,
    pub score: Option<f64>,
    pub complexity_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolReport {
    pub priority: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupReport {
    pub unique_files: u64,
    pub line_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_errors: Option<u64>,
    pub total_warnings: Option<u64>,
    pub untested_source_files: Option<u64>,
    pub coverage_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueReport {
    pub severity: String,
    pub message: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryReport {
    pub id: String,
    pub priority: Option<String>,
    pub errors: Vec<String>,
}

/// Result of attempting to read an artifact from disk.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactLoad {
    Loaded(Box<ScanArtifact>),
    Missing,
    Malformed(String),
}

/// Read and parse one category artifact.
pub fn load_artifact(path: &Path) -> ArtifactLoad {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ArtifactLoad::Missing,
        Err(e) => return ArtifactLoad::Malformed(e.to_string()),
    };
    match serde_json::from_str::<ScanArtifact>(&content) {
        Ok(artifact) => ArtifactLoad::Loaded(Box::new(artifact)),
        Err(e) => ArtifactLoad::Malformed(e.to_string()),
    }
}

/// Canonicalize an artifact load into findings for one category.
///
/// Missing and malformed artifacts each yield exactly one Info finding.
pub fn canonicalize(category: &str, load: &ArtifactLoad) -> Vec<Finding> {
    match load {
        ArtifactLoad::Loaded(artifact) => canonicalize_artifact(artifact),
        ArtifactLoad::Missing => vec![Finding::new(
            Severity::Info,
            format!("{category} audit not yet run"),
        )],
        ArtifactLoad::Malformed(reason) => vec![Finding::new(
            Severity::Info,
            format!("{category} artifact malformed: {reason}"),
        )],
    }
}

fn canonicalize_artifact(artifact: &ScanArtifact) -> Vec<Finding> {
    let mut findings = Vec::new();

    for entry in &artifact.errors {
        let finding = match entry {
            ErrorEntry::Text(message) => Finding::new(Severity::Error, message.clone()),
            ErrorEntry::Detailed { message, file } => {
                let mut f = Finding::new(Severity::Error, message.clone());
                if let Some(file) = file {
                    f = f.with_location(file.clone());
                }
                f
            }
        };
        findings.push(finding);
    }

    for issue in &artifact.issues {
        let severity = map_issue_severity(&issue.severity);
        let message = issue
            .message
            .clone()
            .unwrap_or_else(|| format!("{} issue reported", issue.severity));
        let mut finding = Finding::new(severity, message);
        if let Some(file) = &issue.file {
            finding = finding.with_location(file.clone());
        }
        findings.push(finding);
    }

    for report in &artifact.categories {
        for error in &report.errors {
            findings.push(Finding::new(
                Severity::Error,
                format!("{}: {}", report.id, error),
            ));
        }
    }

    for file in &artifact.files {
        if let Some(score) = file.score {
            if score < LOW_FILE_SCORE {
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        format!("{} scored {score:.0} (below {LOW_FILE_SCORE:.0})", file.repo_path),
                    )
                    .with_location(file.repo_path.clone())
                    .with_suggestion(format!("review and remediate issues in {}", file.repo_path)),
                );
            }
        }
        if let Some(complexity) = file.complexity_score {
            if complexity >= HIGH_COMPLEXITY_SCORE {
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        format!("{} complexity score {complexity:.0}", file.repo_path),
                    )
                    .with_location(file.repo_path.clone())
                    .with_suggestion(format!("refactor {} to reduce complexity", file.repo_path)),
                );
            }
        }
    }

    for pool in &artifact.pools {
        let priority = pool.priority.to_ascii_lowercase();
        if priority == "high" || priority == "critical" {
            let name = pool.name.as_deref().unwrap_or("unnamed");
            findings.push(Finding::new(
                Severity::Warning,
                format!("{priority}-priority pool: {name}"),
            ));
        }
    }

    for group in &artifact.groups {
        if group.unique_files >= LARGE_GROUP_FILES {
            let lines = group.line_count.unwrap_or(0);
            findings.push(
                Finding::new(
                    Severity::Warning,
                    format!(
                        "duplicate group spans {} files ({lines} lines)",
                        group.unique_files
                    ),
                )
                .with_suggestion("extract the duplicated code into a shared module".to_string()),
            );
        }
    }

    if let Some(summary) = &artifact.summary {
        // Summary counts stand in only when no itemized entries were emitted,
        // so the same problem is never counted twice.
        if artifact.errors.is_empty() && artifact.categories.is_empty() {
            if let Some(total) = summary.total_errors {
                if total > 0 {
                    findings.push(Finding::new(
                        Severity::Error,
                        format!("{total} errors reported"),
                    ));
                }
            }
        }
        if artifact.issues.is_empty() {
            if let Some(total) = summary.total_warnings {
                if total > 0 {
                    findings.push(Finding::new(
                        Severity::Warning,
                        format!("{total} warnings reported"),
                    ));
                }
            }
        }
        if let Some(coverage) = summary.coverage_percentage {
            if coverage < COVERAGE_WARN_THRESHOLD {
                findings.push(
                    Finding::new(
                        Severity::Warning,
                        format!("coverage {coverage:.1}% below {COVERAGE_WARN_THRESHOLD:.0}%"),
                    )
                    .with_suggestion("add tests for uncovered source files".to_string()),
                );
            }
        }
        if let Some(untested) = summary.untested_source_files {
            if untested > 0 {
                findings.push(Finding::new(
                    Severity::Info,
                    format!("{untested} source files have no tests"),
                ));
            }
        }
    }

    findings
}

fn map_issue_severity(raw: &str) -> Severity {
    match raw.to_ascii_lowercase().as_str() {
        "error" | "critical" | "high" => Severity::Error,
        "warning" | "medium" => Severity::Warning,
        _ => Severity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_yields_single_info_finding() {
        let findings = canonicalize("security", &ArtifactLoad::Missing);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("not yet run"));
    }

    #[test]
    fn test_malformed_artifact_yields_single_info_finding() {
        let load = ArtifactLoad::Malformed("expected value at line 1".to_string());
        let findings = canonicalize("lint", &load);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("malformed"));
    }

    #[test]
    fn test_load_artifact_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let load = load_artifact(&dir.path().join("lint.json"));
        assert_eq!(load, ArtifactLoad::Missing);
    }

    #[test]
    fn test_load_artifact_rejects_bad_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lint.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(load_artifact(&path), ArtifactLoad::Malformed(_)));
    }

    #[test]
    fn test_errors_become_error_findings() {
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{"errors": ["type mismatch", {"message": "missing import", "file": "src/a.ts"}]}"#,
        )
        .expect("parse");
        let findings = canonicalize("typecheck", &ArtifactLoad::Loaded(Box::new(artifact)));

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == Severity::Error));
        assert_eq!(findings[1].location.as_deref(), Some("src/a.ts"));
    }

    #[test]
    fn test_issue_severity_mapping() {
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{"issues": [
                {"severity": "critical", "message": "sql injection", "file": "src/db.ts"},
                {"severity": "warning", "message": "weak hash"},
                {"severity": "note"}
            ]}"#,
        )
        .expect("parse");
        let findings = canonicalize("security", &ArtifactLoad::Loaded(Box::new(artifact)));

        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[1].severity, Severity::Warning);
        assert_eq!(findings[2].severity, Severity::Info);
    }

    #[test]
    fn test_file_scores_and_complexity_flagged() {
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{"files": [
                {"repoPath": "src/ok.ts", "score": 90},
                {"repoPath": "src/bad.ts", "score": 30},
                {"repoPath": "src/hairy.ts", "complexityScore": 22}
            ]}"#,
        )
        .expect("parse");
        let findings = canonicalize("complexity", &ArtifactLoad::Loaded(Box::new(artifact)));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].location.as_deref(), Some("src/bad.ts"));
        assert_eq!(findings[1].location.as_deref(), Some("src/hairy.ts"));
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        assert!(findings.iter().all(|f| f.suggestion.is_some()));
    }

    #[test]
    fn test_summary_counts_not_double_counted() {
        // Itemized errors present: summary.totalErrors must be ignored.
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{"errors": ["boom"], "summary": {"totalErrors": 5}}"#,
        )
        .expect("parse");
        let findings = canonicalize("typecheck", &ArtifactLoad::Loaded(Box::new(artifact)));
        assert_eq!(
            findings
                .iter()
                .filter(|f| f.severity == Severity::Error)
                .count(),
            1
        );

        // No itemized errors: summary stands in.
        let artifact: ScanArtifact =
            serde_json::from_str(r#"{"summary": {"totalErrors": 5, "totalWarnings": 2}}"#)
                .expect("parse");
        let findings = canonicalize("typecheck", &ArtifactLoad::Loaded(Box::new(artifact)));
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[1].severity, Severity::Warning);
    }

    #[test]
    fn test_coverage_and_untested_files() {
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{"summary": {"coveragePercentage": 62.5, "untestedSourceFiles": 4}}"#,
        )
        .expect("parse");
        let findings = canonicalize("coverage", &ArtifactLoad::Loaded(Box::new(artifact)));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("62.5"));
        assert_eq!(findings[1].severity, Severity::Info);
    }

    #[test]
    fn test_pools_and_groups() {
        let artifact: ScanArtifact = serde_json::from_str(
            r#"{
                "pools": [{"priority": "high", "name": "auth"}, {"priority": "low"}],
                "groups": [{"uniqueFiles": 4, "lineCount": 120}, {"uniqueFiles": 2}]
            }"#,
        )
        .expect("parse");
        let findings = canonicalize("dependencies", &ArtifactLoad::Loaded(Box::new(artifact)));

        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("auth"));
        assert!(findings[1].message.contains("4 files"));
    }

    #[test]
    fn test_empty_artifact_yields_no_findings() {
        let findings = canonicalize(
            "lint",
            &ArtifactLoad::Loaded(Box::new(ScanArtifact::default())),
        );
        assert!(findings.is_empty());
    }
}
