//! External scanner invocation.
//!
//! Scanners are a black box: one configurable command per tier audit that
//! drops per-category JSON artifacts under the workspace's reports
//! directory. Non-zero exit is a tolerated outcome (scanners may
//! legitimately skip work below a change threshold), and a timeout fails
//! only the invocation, never the audit that follows.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::{AuditError, Result, Tier, WorkspaceRoot};

/// Default hard timeout for a full scanner run.
pub const SCANNER_TIMEOUT_SECS: u64 = 300;

/// Outcome of one scanner invocation.
#[derive(Debug, Clone)]
pub struct ScannerRunOutcome {
    /// Exit code (-1 when unavailable, e.g. killed by signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Whether the run was cut off by the timeout.
    pub timed_out: bool,
}

/// Seam for running the configured scanners.
///
/// The production implementation shells out; tests substitute a fake that
/// writes artifacts directly.
#[async_trait]
pub trait ScannerInvoker: Send + Sync {
    /// Run all configured scanners for one tier audit.
    ///
    /// `changed_files`, when present, restricts the scan scope.
    async fn run_scanners(
        &self,
        root: &WorkspaceRoot,
        tier: Tier,
        changed_files: Option<&[String]>,
    ) -> Result<ScannerRunOutcome>;
}

/// Shell-based scanner invoker running one command at the workspace root.
#[derive(Debug, Clone)]
pub struct ShellScannerInvoker {
    command: Vec<String>,
    timeout_secs: u64,
}

impl ShellScannerInvoker {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            timeout_secs: SCANNER_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[async_trait]
impl ScannerInvoker for ShellScannerInvoker {
    async fn run_scanners(
        &self,
        root: &WorkspaceRoot,
        tier: Tier,
        changed_files: Option<&[String]>,
    ) -> Result<ScannerRunOutcome> {
        if self.command.is_empty() {
            return Err(AuditError::ScannerInvocation(
                "scanner command is empty".to_string(),
            ));
        }

        let start = Instant::now();
        let exe = &self.command[0];
        let mut args: Vec<String> = self.command[1..].to_vec();
        args.push(format!("--tier={}", tier.name()));
        if let Some(files) = changed_files {
            for file in files {
                args.push(format!("--file={file}"));
            }
        }

        debug!(exe = %exe, tier = %tier, "Invoking scanners");

        let child = Command::new(exe)
            .args(&args)
            .current_dir(root.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AuditError::ScannerInvocation(format!("spawn {exe}: {e}")))?;

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await;

        let duration_ms = start.elapsed().as_millis() as u64;

        match output {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                if exit_code != 0 {
                    // Tolerated: scanners may no-op below a change threshold.
                    warn!(exit_code, "Scanner run exited non-zero");
                }
                Ok(ScannerRunOutcome {
                    exit_code,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    duration_ms,
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(AuditError::ScannerInvocation(e.to_string())),
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout_secs,
                    "Scanner run timed out"
                );
                Ok(ScannerRunOutcome {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: format!("timed out after {}s", self.timeout_secs),
                    duration_ms,
                    timed_out: true,
                })
            }
        }
    }
}
