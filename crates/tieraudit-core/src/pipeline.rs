//! Start/end audit orchestration.
//!
//! Ties the dispatcher, baseline store, and report writer together. A start
//! audit captures the baseline snapshot; an end audit compares against it.
//! Every infrastructure failure along the way degrades to a warning on the
//! returned run; the pipeline always produces a best-effort result.

use std::sync::Arc;

use tracing::{info, warn};

use crate::baseline::{compare, BaselineStore, Comparison};
use crate::dispatcher::TierAuditDispatcher;
use crate::domain::{Tier, TierAuditResult, WorkspaceRoot};
use crate::report::{write_reports, AuditPhase, ReportPaths};
use crate::scanner::ScannerInvoker;

/// Outcome of one start or end audit run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub audit: TierAuditResult,
    pub comparisons: Vec<Comparison>,
    pub report_paths: Option<ReportPaths>,

    /// Baseline/report IO problems. Informational noise, never a failure.
    pub warnings: Vec<String>,
}

/// Orchestrates tier audits with baseline capture and comparison.
pub struct AuditPipeline {
    dispatcher: TierAuditDispatcher,
    store: BaselineStore,
}

impl AuditPipeline {
    pub fn new(root: WorkspaceRoot, invoker: Arc<dyn ScannerInvoker>) -> Self {
        let store = BaselineStore::new(root.clone());
        let dispatcher = TierAuditDispatcher::new(root, invoker);
        Self { dispatcher, store }
    }

    /// Run a start audit: dispatch, snapshot the baseline, write `-start`
    /// reports.
    pub async fn run_start_audit(
        &self,
        tier: Tier,
        identifier: &str,
        feature_name: &str,
        changed_files: Option<&[String]>,
    ) -> PipelineRun {
        let audit = self
            .dispatcher
            .run_tier_audit(tier, identifier, feature_name, changed_files)
            .await;
        let mut warnings = Vec::new();

        if let Err(e) = self
            .store
            .store(tier, identifier, feature_name, audit.scores())
        {
            warn!(error = %e, "Baseline store failed");
            warnings.push(format!("baseline store failed: {e}"));
        } else {
            info!(tier = %tier, identifier = %identifier, "Baseline snapshot stored");
        }

        let report_paths = self.write_phase_reports(&audit, &[], AuditPhase::Start, &mut warnings);

        PipelineRun {
            audit,
            comparisons: Vec::new(),
            report_paths,
            warnings,
        }
    }

    /// Run an end audit: dispatch, compare against the stored baseline,
    /// write reports.
    pub async fn run_end_audit(
        &self,
        tier: Tier,
        identifier: &str,
        feature_name: &str,
        changed_files: Option<&[String]>,
    ) -> PipelineRun {
        let audit = self
            .dispatcher
            .run_tier_audit(tier, identifier, feature_name, changed_files)
            .await;
        let mut warnings = Vec::new();

        let baseline = match self.store.load(tier, identifier, feature_name) {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!(error = %e, "Baseline load failed");
                warnings.push(format!("baseline load failed: {e}"));
                None
            }
        };
        let comparisons = compare(baseline.as_ref(), &audit.scores());

        let report_paths =
            self.write_phase_reports(&audit, &comparisons, AuditPhase::End, &mut warnings);

        PipelineRun {
            audit,
            comparisons,
            report_paths,
            warnings,
        }
    }

    /// Access the dispatcher, e.g. to share it with an autofix engine.
    pub fn dispatcher(&self) -> &TierAuditDispatcher {
        &self.dispatcher
    }

    fn write_phase_reports(
        &self,
        audit: &TierAuditResult,
        comparisons: &[Comparison],
        phase: AuditPhase,
        warnings: &mut Vec<String>,
    ) -> Option<ReportPaths> {
        match write_reports(self.dispatcher.root(), audit, comparisons, phase) {
            Ok(paths) => Some(paths),
            Err(e) => {
                warn!(error = %e, "Report write failed");
                warnings.push(format!("report write failed: {e}"));
                None
            }
        }
    }
}
