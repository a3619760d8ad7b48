//! Checksum manifest model and strict wire-format parsing.
//!
//! Wire format (JSON):
//!
//! ```json
//! { "id": "v42", "timestamp": "2026-01-05T12:00:00Z",
//!   "files": [ { "path": "app/index.js", "hash": "9f2c..." } ] }
//! ```
//!
//! Parsing is strict: missing fields, duplicate paths, traversal ids, and
//! non-normalized entry paths are all rejected with a typed
//! [`ManifestError`] before anything touches the filesystem.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// File name under which a release directory stores its own manifest.
///
/// Reserved: no manifest entry may claim this path.
pub const RELEASE_MANIFEST_FILE: &str = ".release.json";

// ---------------------------------------------------------------------------
// ReleaseId
// ---------------------------------------------------------------------------

/// A validated release identifier.
///
/// Ids are opaque tokens but double as release directory names, so anything
/// that could escape the releases directory is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(id: impl Into<String>) -> Result<Self, ManifestError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id == "." || id == ".." {
            Some("must not be a relative directory reference")
        } else if id.contains('/') || id.contains('\\') {
            Some("must not contain path separators")
        } else if id.contains('\0') {
            Some("must not contain NUL")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ManifestError::InvalidId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ReleaseId {
    type Error = ManifestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ReleaseId> for String {
    fn from(id: ReleaseId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One file in a release: normalized relative path plus an opaque content
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub hash: String,
}

/// A release's validated file set.
///
/// `files` is keyed by entry path; construction guarantees paths are unique
/// and normalized and that `id` is safe to use as a directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumManifest {
    pub id: ReleaseId,
    pub generated_at: DateTime<Utc>,
    pub files: BTreeMap<String, FileEntry>,
}

/// Raw wire shape; validated into [`ChecksumManifest`] by [`ChecksumManifest::parse`].
#[derive(Debug, Serialize, Deserialize)]
struct ManifestDoc {
    id: String,
    timestamp: DateTime<Utc>,
    files: Vec<FileEntry>,
}

impl ChecksumManifest {
    /// Parse and validate a wire-format manifest document.
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        let doc: ManifestDoc = serde_json::from_str(json)?;
        let id = ReleaseId::new(doc.id)?;
        Self::from_parts(id, doc.timestamp, doc.files)
    }

    /// Build a manifest from already-typed parts, applying the same
    /// validation as [`parse`](Self::parse).
    pub fn from_parts(
        id: ReleaseId,
        generated_at: DateTime<Utc>,
        entries: Vec<FileEntry>,
    ) -> Result<Self, ManifestError> {
        let mut files = BTreeMap::new();
        for entry in entries {
            validate_entry_path(&entry.path)?;
            let path = entry.path.clone();
            if files.insert(path.clone(), entry).is_some() {
                return Err(ManifestError::DuplicatePath { path });
            }
        }
        Ok(Self {
            id,
            generated_at,
            files,
        })
    }

    /// Serialize back to the wire format, entries sorted by path.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        let doc = ManifestDoc {
            id: self.id.as_str().to_owned(),
            timestamp: self.generated_at,
            files: self.files.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

/// Reject entry paths that are not normalized relative `/`-separated paths.
fn validate_entry_path(path: &str) -> Result<(), ManifestError> {
    let fail = |reason| {
        Err(ManifestError::InvalidPath {
            path: path.to_owned(),
            reason,
        })
    };
    if path.is_empty() {
        return fail("must not be empty");
    }
    if path.starts_with('/') {
        return fail("must be relative");
    }
    if path.contains('\\') {
        return fail("must use '/' separators");
    }
    if path.contains('\0') {
        return fail("must not contain NUL");
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return fail("must not contain empty, '.' or '..' segments");
    }
    if path == RELEASE_MANIFEST_FILE {
        return fail("collides with the reserved release manifest name");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Active pointer
// ---------------------------------------------------------------------------

/// Persisted record of the active release id and the last check time.
///
/// Wire format: `{ "id": string, "updated": ISO-8601 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePointer {
    pub id: ReleaseId,
    pub updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
