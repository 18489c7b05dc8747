//! Recursive autofix cascade engine.
//!
//! Findings are matched against the script registry first, then the agent
//! registry; a finding is claimed by at most one rule across both. Script
//! fixes mutate the working tree, so the files they touch are re-audited at
//! the child tier, and that child's findings are fixed recursively. The
//! cascade only walks downward through the tier hierarchy, so it terminates
//! regardless of the depth bound; the bound exists to cap cost, not to
//! ensure termination.

use std::process::Stdio;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

use crate::dispatcher::TierAuditDispatcher;
use crate::domain::{Finding, Severity, Tier, TierAuditResult};
use crate::registry::{expand_command, expand_template, FixAction, FixRegistry};

/// Default hard timeout for one fix command.
pub const FIX_TIMEOUT_SECS: u64 = 60;

/// Which registry produced an entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixKind {
    Script,
    Agent,
}

/// One fix attempt or deferred directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofixEntry {
    pub kind: FixKind,

    /// Audit category the finding came from.
    pub audit_name: String,

    /// The finding this entry addresses.
    pub finding: Finding,

    /// Expanded command (script entries only).
    pub command: Option<Vec<String>>,

    /// Expanded directive (agent entries only; never executed here).
    pub agent_directive: Option<String>,

    /// Files this fix declares it touches.
    pub affected_files: Vec<String>,

    /// Whether a script fix ran successfully. Always false for agent entries.
    pub applied: bool,
}

/// Result of one autofix pass, recursively containing cascade results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofixResult {
    pub tier: Tier,
    pub identifier: String,
    pub script_fixes_applied: usize,
    pub script_fix_entries: Vec<AutofixEntry>,
    pub agent_fix_entries: Vec<AutofixEntry>,

    /// Deduplicated union of affected files from both passes, the scope
    /// for cascading re-audit.
    pub affected_files: Vec<String>,

    /// Child-tier results, one level of nesting per recursive call.
    pub cascade_results: Vec<AutofixResult>,

    /// Human-readable counts, always present even when all are zero.
    pub summary: String,
}

impl AutofixResult {
    /// Commit message for the staging collaborator, when there is anything
    /// worth committing.
    pub fn commit_message(&self) -> Option<String> {
        if self.script_fixes_applied > 0 || !self.affected_files.is_empty() {
            Some(format!(
                "{} {}: Fix audit issues",
                self.tier.display_name(),
                self.identifier
            ))
        } else {
            None
        }
    }
}

/// Options threaded through one autofix invocation and its cascade.
#[derive(Debug, Clone)]
pub struct AutofixOptions {
    /// Tier identifier, reused for cascade re-audits (scope comes from the
    /// restricted file set, not the identifier).
    pub identifier: String,

    pub feature_name: String,

    /// Explicit cascade bound for this call site (0 disables cascading).
    pub max_cascade_depth: u32,

    /// Current depth; starts at 0 and increases by exactly 1 per recursion.
    pub cascade_depth: u32,

    /// Hard timeout per fix command.
    pub fix_timeout_secs: u64,

    /// When true, a finding whose script fix failed stays unclaimed and may
    /// fall through to the agent registry. Default false: failed fixes are
    /// recorded applied=false and never retried nor promoted.
    pub promote_failed_script_fixes: bool,
}

impl AutofixOptions {
    pub fn new(
        identifier: impl Into<String>,
        feature_name: impl Into<String>,
        max_cascade_depth: u32,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            feature_name: feature_name.into(),
            max_cascade_depth,
            cascade_depth: 0,
            fix_timeout_secs: FIX_TIMEOUT_SECS,
            promote_failed_script_fixes: false,
        }
    }
}

/// Applies fixes for one tier audit and drives the downward cascade.
pub struct AutofixEngine {
    registry: FixRegistry,
    dispatcher: TierAuditDispatcher,
}

impl AutofixEngine {
    pub fn new(registry: FixRegistry, dispatcher: TierAuditDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Run the autofix algorithm over one tier audit's findings.
    ///
    /// Boxed because the cascade step recurses through the child tier.
    pub fn run_tier_autofix<'a>(
        &'a self,
        tier: Tier,
        audit: &'a TierAuditResult,
        opts: AutofixOptions,
    ) -> BoxFuture<'a, AutofixResult> {
        Box::pin(async move {
            let findings: Vec<(&str, &Finding)> = audit.all_findings().collect();
            let mut claimed = vec![false; findings.len()];
            let mut script_fix_entries = Vec::new();
            let mut agent_fix_entries = Vec::new();
            let mut script_fixes_applied = 0usize;

            // Pass 1: script fixes, in scanner emission order, first match wins.
            // Info findings are advisory (including the degraded markers for
            // absent or malformed artifacts) and never enter fix matching.
            for (i, (category, finding)) in findings.iter().enumerate() {
                if claimed[i] || finding.severity == Severity::Info {
                    continue;
                }
                let Some(rule) = self.registry.match_script(category, finding) else {
                    continue;
                };
                let FixAction::Script { command } = &rule.action else {
                    continue;
                };

                let command = expand_command(command, finding);
                let applied = self.run_fix_command(&command, opts.fix_timeout_secs).await;
                if applied {
                    script_fixes_applied += 1;
                }

                // Failed fixes are claimed too (never retried, never promoted)
                // unless promotion is explicitly enabled.
                claimed[i] = applied || !opts.promote_failed_script_fixes;

                script_fix_entries.push(AutofixEntry {
                    kind: FixKind::Script,
                    audit_name: category.to_string(),
                    finding: (*finding).clone(),
                    command: Some(command),
                    agent_directive: None,
                    affected_files: finding.location.iter().cloned().collect(),
                    applied,
                });
            }

            // Pass 2: agent directives for everything still unclaimed.
            for (i, (category, finding)) in findings.iter().enumerate() {
                if claimed[i] || finding.severity == Severity::Info {
                    continue;
                }
                let Some(rule) = self.registry.match_agent(category, finding) else {
                    continue;
                };
                let FixAction::Agent { directive } = &rule.action else {
                    continue;
                };

                claimed[i] = true;
                agent_fix_entries.push(AutofixEntry {
                    kind: FixKind::Agent,
                    audit_name: category.to_string(),
                    finding: (*finding).clone(),
                    command: None,
                    agent_directive: Some(expand_template(directive, finding)),
                    affected_files: finding.location.iter().cloned().collect(),
                    applied: false,
                });
            }

            // Pass 3: deduplicated union of affected files from both passes.
            let mut affected_files: Vec<String> = Vec::new();
            for entry in script_fix_entries.iter().chain(agent_fix_entries.iter()) {
                for file in &entry.affected_files {
                    if !affected_files.contains(file) {
                        affected_files.push(file.clone());
                    }
                }
            }

            // Pass 4: cascade downward over the affected files.
            let mut cascade_results = Vec::new();
            if let Some(child_tier) = tier.child() {
                if opts.cascade_depth < opts.max_cascade_depth && !affected_files.is_empty() {
                    info!(
                        tier = %tier,
                        child = %child_tier,
                        depth = opts.cascade_depth,
                        files = affected_files.len(),
                        "Cascading re-audit"
                    );

                    let child_audit = self
                        .dispatcher
                        .run_tier_audit(
                            child_tier,
                            &opts.identifier,
                            &opts.feature_name,
                            Some(&affected_files[..]),
                        )
                        .await;

                    let child_opts = AutofixOptions {
                        cascade_depth: opts.cascade_depth + 1,
                        ..opts.clone()
                    };
                    let child_result = self
                        .run_tier_autofix(child_tier, &child_audit, child_opts)
                        .await;
                    cascade_results.push(child_result);
                }
            }

            let summary = format!(
                "{} script fixes applied, {} agent directives queued, {} affected files, {} cascade re-audits",
                script_fixes_applied,
                agent_fix_entries.len(),
                affected_files.len(),
                cascade_results.len(),
            );

            info!(tier = %tier, summary = %summary, "Autofix pass complete");

            AutofixResult {
                tier,
                identifier: opts.identifier,
                script_fixes_applied,
                script_fix_entries,
                agent_fix_entries,
                affected_files,
                cascade_results,
                summary,
            }
        })
    }

    /// Execute one fix command, best-effort. Any failure (spawn error,
    /// non-zero exit, timeout) yields `false`, never an error.
    async fn run_fix_command(&self, command: &[String], timeout_secs: u64) -> bool {
        if command.is_empty() {
            warn!("Skipping fix with empty command");
            return false;
        }

        let child = match Command::new(&command[0])
            .args(&command[1..])
            .current_dir(self.dispatcher.root().path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(command = ?command, error = %e, "Fix command failed to spawn");
                return false;
            }
        };

        match tokio::time::timeout(
            std::time::Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(Ok(output)) if output.status.success() => true,
            Ok(Ok(output)) => {
                warn!(
                    command = ?command,
                    exit_code = output.status.code().unwrap_or(-1),
                    "Fix command exited non-zero"
                );
                false
            }
            Ok(Err(e)) => {
                warn!(command = ?command, error = %e, "Fix command failed");
                false
            }
            Err(_) => {
                warn!(command = ?command, timeout_secs, "Fix command timed out");
                false
            }
        }
    }
}
