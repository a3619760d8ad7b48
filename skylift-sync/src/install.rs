//! Installer — executes a reconciliation plan into staging, then commits.
//!
//! ## Staging-then-promote contract
//!
//! 1. Assemble everything under `releases/.staging-<id>/`; installed
//!    releases are never written to.
//! 2. Dispatch all reuse/download ops concurrently; join the full set.
//!    One failure discards the whole staging area (already-started
//!    siblings may finish, but their output is discarded with it).
//! 3. Write the manifest into staging.
//! 4. Commit: a single atomic rename of staging to `releases/<id>/`.
//!    An existing target is a stale leftover — abort, never merge.

use std::path::{Path, PathBuf};
use std::thread;

use skylift_core::{ChecksumManifest, ReleaseId};

use crate::error::{io_err, SyncError};
use crate::fetch::{join_url, EmbeddedBaseline, FileFetcher};
use crate::plan::{scaffold_dirs, FileOp, ReconcilePlan};
use crate::store;

/// Assemble a release in staging from the reconciliation plan.
///
/// `active_dir` is the committed release the Reuse ops copy from. Returns
/// the staging directory, ready for [`commit`].
pub fn stage_release(
    root: &Path,
    manifest: &ChecksumManifest,
    plan: &ReconcilePlan,
    active_dir: &Path,
    remote_base: &str,
    files: &dyn FileFetcher,
) -> Result<PathBuf, SyncError> {
    let staging = prepare_staging(root, &manifest.id, &plan.scaffold)?;

    let results: Vec<Result<(), SyncError>> = thread::scope(|s| {
        let staging = &staging;
        let handles: Vec<_> = plan
            .ops
            .iter()
            .map(|op| {
                s.spawn(move || match op {
                    FileOp::Reuse { path } => {
                        files.copy(&active_dir.join(path), &staging.join(path))
                    }
                    FileOp::Download { path } => {
                        files.download(&join_url(remote_base, path), &staging.join(path))
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(io_err(
                        staging,
                        std::io::Error::other("file operation panicked"),
                    ))
                })
            })
            .collect()
    });

    if let Some(err) = results.into_iter().find_map(Result::err) {
        discard(&staging);
        return Err(err);
    }

    if let Err(err) = store::write_release_manifest(&staging, manifest) {
        discard(&staging);
        return Err(err);
    }
    Ok(staging)
}

/// Bootstrap variant: assemble a release in staging straight from the
/// embedded baseline. No Reuse branch — nothing is active yet.
pub fn stage_baseline(
    root: &Path,
    manifest: &ChecksumManifest,
    baseline: &dyn EmbeddedBaseline,
) -> Result<PathBuf, SyncError> {
    let staging = prepare_staging(root, &manifest.id, &scaffold_dirs(manifest))?;

    for path in manifest.files.keys() {
        let bytes = match baseline.file(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                discard(&staging);
                return Err(err);
            }
        };
        let dest = staging.join(path);
        if let Err(err) = std::fs::write(&dest, bytes) {
            discard(&staging);
            return Err(io_err(&dest, err));
        }
    }

    if let Err(err) = store::write_release_manifest(&staging, manifest) {
        discard(&staging);
        return Err(err);
    }
    Ok(staging)
}

/// Atomically promote a staged tree to the id-named release directory.
///
/// The rename is the single linearization point of a sync attempt.
pub fn commit(root: &Path, id: &ReleaseId, staging: &Path) -> Result<PathBuf, SyncError> {
    let target = store::release_dir(root, id);
    if target.exists() {
        discard(staging);
        return Err(SyncError::CommitCollision { path: target });
    }
    if let Err(err) = std::fs::rename(staging, &target) {
        discard(staging);
        return Err(io_err(&target, err));
    }
    tracing::info!("committed release {} at {}", id, target.display());
    Ok(target)
}

/// Fresh staging directory with all scaffolding created up front.
///
/// A leftover staging dir from an aborted attempt holds no installed
/// content, so it is simply cleared.
fn prepare_staging(
    root: &Path,
    id: &ReleaseId,
    scaffold: &std::collections::BTreeSet<PathBuf>,
) -> Result<PathBuf, SyncError> {
    let staging = store::staging_dir(root, id);
    if staging.exists() {
        std::fs::remove_dir_all(&staging).map_err(|e| io_err(&staging, e))?;
    }
    std::fs::create_dir_all(&staging).map_err(|e| io_err(&staging, e))?;
    for dir in scaffold {
        let full = staging.join(dir);
        std::fs::create_dir_all(&full).map_err(|e| io_err(&full, e))?;
    }
    Ok(staging)
}

fn discard(staging: &Path) {
    if let Err(err) = std::fs::remove_dir_all(staging) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("could not discard staging {}: {err}", staging.display());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
