//! tieraudit - tiered quality gate auditing CLI
//!
//! ## Commands
//!
//! - `audit`: run a tier audit; `--start` captures a baseline snapshot,
//!   otherwise scores are compared against the stored baseline
//! - `autofix`: run a tier audit, apply script fixes, queue agent
//!   directives, and cascade re-audits downward through the tier hierarchy
//!
//! Exits 0 when the overall audit status is not Fail, else 1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use tieraudit_core::{
    init_tracing, AuditPipeline, AuditStatus, AutofixEngine, AutofixOptions, AutofixResult,
    FixRegistry, PipelineRun, ShellScannerInvoker, Tier, TierAuditDispatcher, WorkspaceRoot,
};

#[derive(Parser)]
#[command(name = "tieraudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tiered quality gate auditing with autofix cascade", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tier audit and write markdown + JSON reports
    Audit {
        /// Tier: feature, phase, session, or task
        tier: String,

        /// Tier identifier (e.g. a phase number or session slug)
        identifier: String,

        /// Feature the audit belongs to
        feature: String,

        /// Capture a baseline snapshot instead of comparing against one
        #[arg(long)]
        start: bool,

        /// Restrict the scan to these files (repeatable)
        #[arg(long = "changed-file")]
        changed_files: Vec<String>,

        /// Workspace root of the project being audited
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Scanner command, split on whitespace
        #[arg(long, default_value = "npm run audit:scan")]
        scanner_cmd: String,
    },

    /// Run a tier audit, then apply fixes with a bounded cascade
    Autofix {
        /// Tier: feature, phase, session, or task
        tier: String,

        /// Tier identifier
        identifier: String,

        /// Feature the audit belongs to
        feature: String,

        /// Maximum cascade re-audit depth (0 disables cascading)
        #[arg(long, default_value_t = 1)]
        max_cascade_depth: u32,

        /// Restrict the scan to these files (repeatable)
        #[arg(long = "changed-file")]
        changed_files: Vec<String>,

        /// Workspace root of the project being audited
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Scanner command, split on whitespace
        #[arg(long, default_value = "npm run audit:scan")]
        scanner_cmd: String,
    },
}

fn parse_tier(raw: &str) -> Result<Tier> {
    raw.parse::<Tier>()
        .with_context(|| format!("invalid tier '{raw}'"))
}

fn invoker_from(scanner_cmd: &str) -> Arc<ShellScannerInvoker> {
    let command: Vec<String> = scanner_cmd.split_whitespace().map(String::from).collect();
    Arc::new(ShellScannerInvoker::new(command))
}

fn changed_files_opt(changed_files: &[String]) -> Option<&[String]> {
    if changed_files.is_empty() {
        None
    } else {
        Some(changed_files)
    }
}

async fn cmd_audit(
    tier: Tier,
    identifier: &str,
    feature: &str,
    start: bool,
    changed_files: &[String],
    root: PathBuf,
    scanner_cmd: &str,
) -> Result<AuditStatus> {
    let pipeline = AuditPipeline::new(WorkspaceRoot::new(root), invoker_from(scanner_cmd));
    let changed = changed_files_opt(changed_files);

    let run: PipelineRun = if start {
        pipeline
            .run_start_audit(tier, identifier, feature, changed)
            .await
    } else {
        pipeline
            .run_end_audit(tier, identifier, feature, changed)
            .await
    };

    println!(
        "{} audit '{}' ({}): {}",
        tier.display_name(),
        identifier,
        feature,
        run.audit.overall_status
    );
    for result in &run.audit.results {
        println!("  {}", result.summary);
    }
    for comparison in &run.comparisons {
        let delta = comparison
            .delta
            .map(|d| format!("{d:+}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}: {:?} (delta {})",
            comparison.category, comparison.status, delta
        );
    }
    if let Some(paths) = &run.report_paths {
        println!("Report: {}", paths.markdown.display());
    }
    for warning in &run.warnings {
        eprintln!("warning: {warning}");
    }

    Ok(run.audit.overall_status)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_autofix(
    tier: Tier,
    identifier: &str,
    feature: &str,
    max_cascade_depth: u32,
    changed_files: &[String],
    root: PathBuf,
    scanner_cmd: &str,
) -> Result<AuditStatus> {
    let root = WorkspaceRoot::new(root);
    let invoker = invoker_from(scanner_cmd);
    let dispatcher = TierAuditDispatcher::new(root.clone(), invoker.clone());

    let audit = dispatcher
        .run_tier_audit(tier, identifier, feature, changed_files_opt(changed_files))
        .await;

    let engine = AutofixEngine::new(
        FixRegistry::default(),
        TierAuditDispatcher::new(root, invoker),
    );
    let result = engine
        .run_tier_autofix(
            tier,
            &audit,
            AutofixOptions::new(identifier, feature, max_cascade_depth),
        )
        .await;

    print_autofix(&result, 0);
    if let Some(message) = result.commit_message() {
        println!("Commit message: {message}");
    }

    Ok(audit.overall_status)
}

fn print_autofix(result: &AutofixResult, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}[{}] {}", result.tier.display_name(), result.summary);
    for entry in &result.agent_fix_entries {
        if let Some(directive) = &entry.agent_directive {
            println!("{indent}  agent: {directive}");
        }
    }
    for child in &result.cascade_results {
        print_autofix(child, depth + 1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let status = match cli.command {
        Commands::Audit {
            tier,
            identifier,
            feature,
            start,
            changed_files,
            root,
            scanner_cmd,
        } => {
            cmd_audit(
                parse_tier(&tier)?,
                &identifier,
                &feature,
                start,
                &changed_files,
                root,
                &scanner_cmd,
            )
            .await?
        }
        Commands::Autofix {
            tier,
            identifier,
            feature,
            max_cascade_depth,
            changed_files,
            root,
            scanner_cmd,
        } => {
            cmd_autofix(
                parse_tier(&tier)?,
                &identifier,
                &feature,
                max_cascade_depth,
                &changed_files,
                root,
                &scanner_cmd,
            )
            .await?
        }
    };

    if status == AuditStatus::Fail {
        std::process::exit(1);
    }
    Ok(())
}
