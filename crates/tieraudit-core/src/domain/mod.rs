//! Core domain types for tier audits.

pub mod audit;
pub mod error;
pub mod finding;
pub mod tier;
pub mod workspace;

pub use audit::{compute_plan_digest, AuditResult, AuditStatus, ScoreOutcome, TierAuditResult};
pub use error::{AuditError, Result};
pub use finding::{Finding, Severity};
pub use tier::{ParseTierError, Tier};
pub use workspace::WorkspaceRoot;
