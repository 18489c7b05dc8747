//! Domain-level error taxonomy for tieraudit.
//!
//! Most failure modes deliberately do not appear here: absent or malformed
//! scan artifacts degrade to Info findings, failed fix commands are recorded
//! on their autofix entries, and report/baseline IO problems become warning
//! strings on the result. `AuditError` covers only the cases where a caller
//! genuinely cannot proceed.

/// tieraudit domain errors.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("scanner invocation failed: {0}")]
    ScannerInvocation(String),

    #[error("baseline store error: {0}")]
    BaselineStore(String),

    #[error("report write error: {0}")]
    ReportWrite(String),

    #[error("fix command is empty for rule matching category {category}")]
    EmptyFixCommand { category: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tieraudit domain operations.
pub type Result<T> = std::result::Result<T, AuditError>;
