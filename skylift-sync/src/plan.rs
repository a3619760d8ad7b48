//! Reconciliation planner — per-file reuse-vs-download decisions.
//!
//! A file is reused only when the active manifest has the identical path
//! with the identical hash; everything else is downloaded. Files absent
//! from the new manifest are never carried over.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use skylift_core::ChecksumManifest;

/// A single planned file operation, keyed by manifest-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOp {
    /// Copy byte-for-byte from the active release; no network.
    Reuse { path: String },
    /// Stream from the remote base into staging.
    Download { path: String },
}

impl FileOp {
    pub fn path(&self) -> &str {
        match self {
            FileOp::Reuse { path } | FileOp::Download { path } => path,
        }
    }
}

/// The full plan for assembling one release in staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// One op per new-manifest entry, in path order.
    pub ops: Vec<FileOp>,
    /// Distinct parent-directory prefixes across all new paths; created
    /// before any file operation begins.
    pub scaffold: BTreeSet<PathBuf>,
}

impl ReconcilePlan {
    pub fn reuse_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, FileOp::Reuse { .. }))
            .count()
    }

    pub fn download_count(&self) -> usize {
        self.ops.len() - self.reuse_count()
    }
}

/// Plan the reconciliation of `new` against the `active` manifest.
///
/// Both manifests are already validated; an empty file set yields an empty
/// (but valid) plan.
pub fn plan(new: &ChecksumManifest, active: &ChecksumManifest) -> ReconcilePlan {
    let ops = new
        .files
        .values()
        .map(|entry| {
            let reusable = active
                .files
                .get(&entry.path)
                .is_some_and(|have| have.hash == entry.hash);
            if reusable {
                FileOp::Reuse {
                    path: entry.path.clone(),
                }
            } else {
                FileOp::Download {
                    path: entry.path.clone(),
                }
            }
        })
        .collect();

    ReconcilePlan {
        ops,
        scaffold: scaffold_dirs(new),
    }
}

/// Distinct parent-path prefixes for every entry in `manifest`.
pub fn scaffold_dirs(manifest: &ChecksumManifest) -> BTreeSet<PathBuf> {
    manifest
        .files
        .keys()
        .filter_map(|path| Path::new(path).parent())
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
