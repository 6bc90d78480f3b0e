//! Error taxonomy for every Planwise operation.
//!
//! Each pipeline stage fails with a specific variant so callers can tell a
//! rejected upload apart from a broken LLM call or a lost daily log. CLI
//! code converts these into `anyhow` at the boundary; nothing here panics.

/// A failure from any Planwise operation.
///
/// Parse failures deserve a note: `analyze` and `tech-stack` absorb them
/// into documented fallback values and never return `ParseFailure`; daily
/// task generation surfaces it as-is.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The filename suffix is neither `.pdf` nor `.txt`.
    #[error("unsupported file kind: '{0}' (only .pdf and .txt are accepted)")]
    UnsupportedFileKind(String),

    /// Extraction produced only whitespace.
    #[error("document is empty or no text could be extracted")]
    EmptyContent,

    /// The document is too small for a meaningful analysis.
    #[error("document must contain at least {min} non-whitespace characters")]
    ContentTooShort { min: usize },

    /// The underlying decoder failed (corrupt PDF, invalid UTF-8).
    #[error("text extraction failed: {0}")]
    ExtractionFailure(String),

    /// LLM or embedding API transport error, timeout, or non-2xx status.
    #[error("external service call failed: {0}")]
    ExternalServiceFailure(String),

    /// The LLM response contained no parseable JSON of the expected shape.
    #[error("could not parse model response: {0}")]
    ParseFailure(String),

    /// A transactional write failed and was rolled back.
    #[error("persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// No daily log exists for the requested project/day.
    #[error("no daily log for project {project_id}, day {day_number}")]
    LogNotFound {
        project_id: String,
        day_number: i64,
    },
}

/// Convenience alias used throughout the crate.
pub type PlanResult<T> = Result<T, PlanError>;

impl From<sqlx::Error> for PlanError {
    fn from(e: sqlx::Error) -> Self {
        PlanError::PersistenceFailure(e.to_string())
    }
}
