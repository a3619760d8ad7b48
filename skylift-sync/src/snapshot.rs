//! Directory snapshots — publisher-side manifest generation.
//!
//! Produces the SHA-256 manifests the engine later consumes. The engine
//! itself keeps treating hashes as opaque fingerprints; this module is the
//! only place that computes them.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};

use skylift_core::{ChecksumManifest, FileEntry, ReleaseId, RELEASE_MANIFEST_FILE};

use crate::error::{io_err, SyncError};
use crate::fetch::MANIFEST_ENDPOINT;

/// Walk `dir` and build a manifest of its files under `id`.
///
/// Paths are `/`-separated and relative to `dir`; the reserved release
/// manifest name and a top-level `manifest.json` are skipped so a packed
/// directory can be snapshotted again without listing its own manifest.
pub fn snapshot_dir(dir: &Path, id: ReleaseId) -> Result<ChecksumManifest, SyncError> {
    let mut entries = Vec::new();
    walk(dir, dir, &mut entries)?;
    Ok(ChecksumManifest::from_parts(id, Utc::now(), entries)?)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<FileEntry>) -> Result<(), SyncError> {
    let mut children: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .collect();
    children.sort_by_key(|e| e.file_name());

    for child in children {
        let path = child.path();
        let file_type = child.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            walk(root, &path, out)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let rel = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if rel == RELEASE_MANIFEST_FILE || rel == MANIFEST_ENDPOINT {
            continue;
        }

        let bytes = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
        let digest = {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            hex::encode(hasher.finalize())
        };
        out.push(FileEntry {
            path: rel,
            hash: digest,
        });
    }
    Ok(())
}
