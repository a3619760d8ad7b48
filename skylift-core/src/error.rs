//! Error types for skylift-core.

use thiserror::Error;

/// All errors that can arise from manifest parsing and validation.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// JSON syntax or shape error from serde.
    #[error("malformed manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entries in the wire document claim the same path.
    #[error("duplicate manifest path: {path}")]
    DuplicatePath { path: String },

    /// An entry path failed normalization rules.
    #[error("invalid manifest path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A release id is unusable as a directory name.
    #[error("invalid release id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },
}
