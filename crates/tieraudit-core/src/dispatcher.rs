//! Tier audit dispatch.
//!
//! Resolves the static per-tier audit plan, invokes the scanners once, then
//! loads each category artifact strictly sequentially. Sequential order
//! matters: later categories may observe filesystem state mutated by a prior
//! script-fix pass, so processing must be deterministic.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifact::{canonicalize, load_artifact};
use crate::domain::{
    compute_plan_digest, AuditResult, Result, Tier, TierAuditResult, WorkspaceRoot,
};
use crate::scanner::ScannerInvoker;
use crate::scorer;

/// Static audit plan for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAuditPlan {
    /// Category names, in processing order.
    pub categories: Vec<String>,

    /// Whether the scan is restricted to changed files.
    pub changed_files_only: bool,
}

/// Resolve the configured audit plan for a tier.
///
/// Broader tiers run the full category set; the narrow tiers run a fast
/// subset restricted to changed files.
pub fn plan_for(tier: Tier) -> TierAuditPlan {
    let (categories, changed_files_only): (&[&str], bool) = match tier {
        Tier::Feature => (
            &[
                "architecture",
                "security",
                "complexity",
                "coverage",
                "dependencies",
                "lint",
                "typecheck",
            ],
            false,
        ),
        Tier::Phase => (
            &["security", "complexity", "coverage", "lint", "typecheck"],
            false,
        ),
        Tier::Session => (&["complexity", "coverage", "lint", "typecheck"], true),
        Tier::Task => (&["lint", "typecheck"], true),
    };

    TierAuditPlan {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        changed_files_only,
    }
}

/// Dispatches tier audits: one scanner run, then per-category artifact
/// processing into a [`TierAuditResult`].
pub struct TierAuditDispatcher {
    root: WorkspaceRoot,
    invoker: Arc<dyn ScannerInvoker>,
}

impl TierAuditDispatcher {
    pub fn new(root: WorkspaceRoot, invoker: Arc<dyn ScannerInvoker>) -> Self {
        Self { root, invoker }
    }

    pub fn root(&self) -> &WorkspaceRoot {
        &self.root
    }

    /// Run a complete tier audit. Infallible by design: every failure mode
    /// degrades to findings or to entries in the result's `errors` list, so
    /// a report can always be produced.
    pub async fn run_tier_audit(
        &self,
        tier: Tier,
        identifier: &str,
        feature_name: &str,
        changed_files: Option<&[String]>,
    ) -> TierAuditResult {
        let run_id = Uuid::new_v4();
        let plan = plan_for(tier);
        let mut errors = Vec::new();

        info!(
            run_id = %run_id,
            tier = %tier,
            identifier = %identifier,
            categories = plan.categories.len(),
            "Starting tier audit"
        );

        let scope = if plan.changed_files_only {
            changed_files
        } else {
            None
        };

        match self.invoker.run_scanners(&self.root, tier, scope).await {
            Ok(outcome) if outcome.timed_out => {
                errors.push(format!(
                    "scanner run timed out after {}ms; reading existing artifacts",
                    outcome.duration_ms
                ));
            }
            Ok(_) => {}
            Err(e) => {
                // Proceed to read whatever artifacts already exist.
                warn!(error = %e, "Scanner invocation failed");
                errors.push(format!("scanner invocation failed: {e}"));
            }
        }

        let mut results = Vec::new();
        for category in &plan.categories {
            match self.process_category(category) {
                Ok(result) => results.push(result),
                Err(e) => {
                    // Boundary: one category's failure never aborts siblings.
                    warn!(category = %category, error = %e, "Category audit failed");
                    errors.push(format!("{category} audit failed: {e}"));
                }
            }
        }

        let overall_status = TierAuditResult::overall_status_of(&results);
        let report_path = self
            .root
            .audits_dir()
            .join(format!("{}-{}-audit.md", tier.name(), identifier))
            .to_string_lossy()
            .to_string();

        info!(
            run_id = %run_id,
            status = %overall_status,
            "Tier audit complete"
        );

        TierAuditResult {
            run_id,
            tier,
            identifier: identifier.to_string(),
            feature_name: feature_name.to_string(),
            overall_status,
            results,
            timestamp: Utc::now(),
            plan_digest: compute_plan_digest(&plan.categories),
            report_path,
            errors,
        }
    }

    /// Load, canonicalize, and score one category artifact.
    fn process_category(&self, category: &str) -> Result<AuditResult> {
        let load = load_artifact(&self.root.artifact_path(category));
        let findings = canonicalize(category, &load);
        let outcome = scorer::score(category, &findings);
        Ok(AuditResult::new(category, outcome, findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditStatus;
    use crate::scanner::ScannerRunOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fake invoker that records its calls and touches no filesystem.
    struct RecordingInvoker {
        calls: Mutex<Vec<(Tier, Option<Vec<String>>)>>,
    }

    impl RecordingInvoker {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ScannerInvoker for RecordingInvoker {
        async fn run_scanners(
            &self,
            _root: &WorkspaceRoot,
            tier: Tier,
            changed_files: Option<&[String]>,
        ) -> Result<ScannerRunOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((tier, changed_files.map(|f| f.to_vec())));
            Ok(ScannerRunOutcome {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: 1,
                timed_out: false,
            })
        }
    }

    #[test]
    fn test_plan_categories_per_tier() {
        assert_eq!(plan_for(Tier::Feature).categories.len(), 7);
        assert!(!plan_for(Tier::Feature).changed_files_only);
        assert_eq!(
            plan_for(Tier::Task).categories,
            vec!["lint".to_string(), "typecheck".to_string()]
        );
        assert!(plan_for(Tier::Task).changed_files_only);
        assert!(plan_for(Tier::Session).changed_files_only);
    }

    #[tokio::test]
    async fn test_absent_artifacts_degrade_to_info_and_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher = TierAuditDispatcher::new(
            WorkspaceRoot::new(dir.path()),
            Arc::new(RecordingInvoker::new()),
        );

        let result = dispatcher
            .run_tier_audit(Tier::Task, "t1", "billing", None)
            .await;

        assert_eq!(result.overall_status, AuditStatus::Pass);
        assert_eq!(result.results.len(), 2);
        for r in &result.results {
            assert_eq!(r.findings.len(), 1);
            assert!(r.findings[0].message.contains("not yet run"));
        }
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_changed_files_forwarded_only_for_restricted_tiers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let invoker = Arc::new(RecordingInvoker::new());
        let dispatcher =
            TierAuditDispatcher::new(WorkspaceRoot::new(dir.path()), invoker.clone());

        let changed = vec!["src/a.ts".to_string()];
        dispatcher
            .run_tier_audit(Tier::Task, "t1", "billing", Some(&changed[..]))
            .await;
        dispatcher
            .run_tier_audit(Tier::Feature, "billing", "billing", Some(&changed[..]))
            .await;

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls[0].1.as_deref(), Some(&changed[..]));
        assert!(calls[1].1.is_none(), "full-scan tiers ignore changed files");
    }

    #[tokio::test]
    async fn test_failing_categories_become_fail_status() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = WorkspaceRoot::new(dir.path());
        std::fs::create_dir_all(root.reports_dir()).expect("mkdir");
        std::fs::write(
            root.artifact_path("typecheck"),
            r#"{"errors": ["type mismatch in src/a.ts"]}"#,
        )
        .expect("write artifact");

        let dispatcher = TierAuditDispatcher::new(root, Arc::new(RecordingInvoker::new()));
        let result = dispatcher
            .run_tier_audit(Tier::Task, "t1", "billing", None)
            .await;

        assert_eq!(result.overall_status, AuditStatus::Fail);
        let typecheck = result
            .results
            .iter()
            .find(|r| r.category == "typecheck")
            .unwrap();
        assert_eq!(typecheck.status, AuditStatus::Fail);
        assert_eq!(typecheck.score, 80);
    }

    #[tokio::test]
    async fn test_scanner_failure_is_noise_not_failure() {
        struct BrokenInvoker;

        #[async_trait]
        impl ScannerInvoker for BrokenInvoker {
            async fn run_scanners(
                &self,
                _root: &WorkspaceRoot,
                _tier: Tier,
                _changed_files: Option<&[String]>,
            ) -> Result<ScannerRunOutcome> {
                Err(crate::domain::AuditError::ScannerInvocation(
                    "spawn failed".to_string(),
                ))
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher =
            TierAuditDispatcher::new(WorkspaceRoot::new(dir.path()), Arc::new(BrokenInvoker));

        let result = dispatcher
            .run_tier_audit(Tier::Task, "t1", "billing", None)
            .await;

        assert_eq!(result.overall_status, AuditStatus::Pass);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("scanner invocation failed"));
    }

    #[tokio::test]
    async fn test_plan_digest_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher = TierAuditDispatcher::new(
            WorkspaceRoot::new(dir.path()),
            Arc::new(RecordingInvoker::new()),
        );

        let result = dispatcher
            .run_tier_audit(Tier::Task, "t1", "billing", None)
            .await;
        let expected = compute_plan_digest(&plan_for(Tier::Task).categories);
        assert_eq!(result.plan_digest, expected);
    }
}
