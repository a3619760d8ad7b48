//! Release store — persisted active-release pointer and per-release manifests.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   active.json              pointer record { id, updated }
//!   releases/
//!     <id>/                  one immutable committed release per id
//!       .release.json        that release's own manifest
//!     .staging-<id>/         transient assembly area, promoted by rename
//! ```
//!
//! Pointer writes use the atomic `.tmp` + rename pattern. Each release's
//! manifest lives inside its own directory so the reconciliation source of
//! truth travels with the content it describes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use skylift_core::{ActivePointer, ChecksumManifest, ReleaseId, RELEASE_MANIFEST_FILE};

use crate::error::{io_err, SyncError};

/// Pointer file name under the state root.
pub const POINTER_FILE: &str = "active.json";

// ---------------------------------------------------------------------------
// Path helpers (pure, no I/O)
// ---------------------------------------------------------------------------

/// `<root>/active.json`
pub fn pointer_path(root: &Path) -> PathBuf {
    root.join(POINTER_FILE)
}

/// `<root>/releases/`
pub fn releases_dir(root: &Path) -> PathBuf {
    root.join("releases")
}

/// `<root>/releases/<id>/`
pub fn release_dir(root: &Path, id: &ReleaseId) -> PathBuf {
    releases_dir(root).join(id.as_str())
}

/// `<root>/releases/.staging-<id>/` — same parent as the commit target so
/// the promoting rename never crosses a filesystem boundary.
pub fn staging_dir(root: &Path, id: &ReleaseId) -> PathBuf {
    releases_dir(root).join(format!(".staging-{}", id.as_str()))
}

// ---------------------------------------------------------------------------
// Active pointer
// ---------------------------------------------------------------------------

/// Load the active pointer.
///
/// A missing, unreadable, or corrupt pointer is "no active release" — the
/// bootstrap trigger — never a fatal error.
pub fn load_pointer(root: &Path) -> Option<ActivePointer> {
    let path = pointer_path(root);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracing::warn!("unreadable pointer at {}: {err}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(pointer) => Some(pointer),
        Err(err) => {
            tracing::warn!("corrupt pointer at {}: {err}", path.display());
            None
        }
    }
}

/// Persist the active pointer atomically.
///
/// Writes to `active.json.tmp` then renames to `active.json`.
pub fn save_pointer(
    root: &Path,
    id: &ReleaseId,
    updated: DateTime<Utc>,
) -> Result<(), SyncError> {
    std::fs::create_dir_all(root).map_err(|e| io_err(root, e))?;
    let path = pointer_path(root);
    let pointer = ActivePointer {
        id: id.clone(),
        updated,
    };
    let json = serde_json::to_string_pretty(&pointer)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-release manifests
// ---------------------------------------------------------------------------

/// Load the manifest stored inside a committed release directory.
pub fn load_release_manifest(root: &Path, id: &ReleaseId) -> Result<ChecksumManifest, SyncError> {
    let path = release_dir(root, id).join(RELEASE_MANIFEST_FILE);
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(ChecksumManifest::parse(&contents)?)
}

/// Write a manifest into a (staging) release directory.
pub fn write_release_manifest(dir: &Path, manifest: &ChecksumManifest) -> Result<(), SyncError> {
    let path = dir.join(RELEASE_MANIFEST_FILE);
    let json = manifest.to_json()?;
    std::fs::write(&path, json).map_err(|e| io_err(&path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
