//! Error types for skylift-sync.

use std::path::PathBuf;

use thiserror::Error;

use skylift_core::ManifestError;

/// All errors that can arise from a sync attempt.
///
/// Every variant is caught at the orchestrator boundary and degrades to a
/// "no update performed" outcome; nothing here ever reaches `sync()` callers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed or invalid manifest (remote, baseline, or persisted).
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (pointer record).
    #[error("state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transient network failure fetching a manifest or file.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Commit rename target already exists — stale leftover release dir.
    #[error("release directory already exists: {path}")]
    CommitCollision { path: PathBuf },

    /// The activator collaborator rejected the new content root.
    #[error("activation failed: {reason}")]
    Activate { reason: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
