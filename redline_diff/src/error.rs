use redline_model::ModelError;

/// Errors that abort a comparison.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// An input document could not be loaded or violates a structural invariant.
    #[error(transparent)]
    MalformedDocument(#[from] ModelError),

    /// Settings were rejected before any processing began.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An internal consistency check failed; no output is produced.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}
