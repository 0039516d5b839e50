use crate::BlockPath;

/// Errors raised while loading or validating a document.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The tree violates a structural invariant.
    #[error("malformed document at {location}: {reason}")]
    MalformedDocument { location: BlockPath, reason: String },

    /// The input bytes are not a decodable document.
    #[error("document could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

pub(crate) fn malformed(location: &[usize], reason: impl Into<String>) -> ModelError {
    ModelError::MalformedDocument {
        location: BlockPath(location.to_vec()),
        reason: reason.into(),
    }
}
