//! tieraudit core library.
//!
//! Deterministic quality-gate auditing at four nested scopes (feature,
//! phase, session, task):
//! - dispatches tier audits over opaque scanner artifacts
//! - scores findings with a pure penalty table
//! - snapshots baselines at tier-start and compares at tier-end
//! - applies script fixes and queues agent directives, cascading re-audits
//!   downward through the tier hierarchy

pub mod artifact;
pub mod autofix;
pub mod baseline;
pub mod dispatcher;
pub mod domain;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod scorer;
pub mod telemetry;

pub use artifact::{canonicalize, load_artifact, ArtifactLoad, ScanArtifact};
pub use autofix::{
    AutofixEngine, AutofixEntry, AutofixOptions, AutofixResult, FixKind, FIX_TIMEOUT_SECS,
};
pub use baseline::{compare, BaselineSnapshot, BaselineStore, Comparison, ComparisonStatus};
pub use dispatcher::{plan_for, TierAuditDispatcher, TierAuditPlan};
pub use domain::{
    AuditError, AuditResult, AuditStatus, Finding, Result, ScoreOutcome, Severity, Tier,
    TierAuditResult, WorkspaceRoot,
};
pub use pipeline::{AuditPipeline, PipelineRun};
pub use registry::{FixAction, FixRegistry, FixRule};
pub use report::{render_markdown, write_reports, AuditPhase, AuditReportArtifact, ReportPaths};
pub use scanner::{ScannerInvoker, ScannerRunOutcome, ShellScannerInvoker, SCANNER_TIMEOUT_SECS};
pub use telemetry::init_tracing;
