//! Sync orchestrator — drives one end-to-end update attempt.
//!
//! State machine: `BOOTSTRAP → GATE → FETCH_MANIFEST → DIFF → RECONCILE →
//! COMMIT → GC → ACTIVATE`. Every internal failure degrades to "no update
//! performed"; a previously-working release is never disturbed by a failed
//! attempt, because staging never overwrites installed content and the
//! pointer is rewritten only after activation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use skylift_core::{ActivePointer, ChecksumManifest, ReleaseId};

use crate::error::{io_err, SyncError};
use crate::fetch::{
    join_url, Activator, EmbeddedBaseline, FileFetcher, ManifestFetcher, PlatformGate,
    MANIFEST_ENDPOINT,
};
use crate::{gc, install, plan, store};

/// Outcome of one sync attempt.
///
/// Collapsed to a boolean only at the public [`SyncEngine::sync`] boundary;
/// "already up to date" and "too soon" are normal steady-state results, not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First run: the embedded baseline was installed and activated.
    Bootstrapped,
    /// Remote manifest id matches the active release; check time refreshed.
    UpToDate,
    /// The minimum check interval has not elapsed.
    TooSoon,
    /// Not a native runtime; sync does not apply here.
    Skipped,
    /// Something went wrong; the previous release is untouched.
    Failed,
    /// A new release was installed and activated.
    Updated,
}

impl SyncOutcome {
    /// True iff a new release was installed and activated.
    pub fn updated(&self) -> bool {
        matches!(self, SyncOutcome::Bootstrapped | SyncOutcome::Updated)
    }
}

/// The active release as loaded at the start of an attempt.
struct ActiveRelease {
    pointer: ActivePointer,
    manifest: ChecksumManifest,
    dir: PathBuf,
}

/// Drives sync attempts against a local state root through the collaborator
/// seams. One attempt is assumed in flight at a time; callers serialize.
pub struct SyncEngine<'a> {
    root: PathBuf,
    platform: &'a dyn PlatformGate,
    manifests: &'a dyn ManifestFetcher,
    files: &'a dyn FileFetcher,
    activator: &'a dyn Activator,
    baseline: &'a dyn EmbeddedBaseline,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        platform: &'a dyn PlatformGate,
        manifests: &'a dyn ManifestFetcher,
        files: &'a dyn FileFetcher,
        activator: &'a dyn Activator,
        baseline: &'a dyn EmbeddedBaseline,
    ) -> Self {
        Self {
            root: root.into(),
            platform,
            manifests,
            files,
            activator,
            baseline,
        }
    }

    /// Run one sync attempt. Never propagates errors; returns true iff a
    /// new release was installed and activated.
    pub fn sync(&self, remote_base: &str, min_check_interval: Duration) -> bool {
        self.sync_outcome(remote_base, min_check_interval).updated()
    }

    /// Run one sync attempt, keeping the outcome variants distinct.
    pub fn sync_outcome(&self, remote_base: &str, min_check_interval: Duration) -> SyncOutcome {
        if !self.platform.is_native_runtime() {
            tracing::debug!("not a native runtime; sync skipped");
            return SyncOutcome::Skipped;
        }

        // Missing or corrupt local state means fresh install. The first
        // invocation never attempts a remote check.
        let Some(active) = self.load_active() else {
            return match self.bootstrap() {
                Ok(id) => {
                    tracing::info!("bootstrapped baseline release {id}");
                    SyncOutcome::Bootstrapped
                }
                Err(err) => {
                    tracing::warn!("bootstrap failed: {err}");
                    SyncOutcome::Failed
                }
            };
        };

        let now = Utc::now();
        let min_interval =
            TimeDelta::from_std(min_check_interval).unwrap_or(TimeDelta::MAX);
        if now.signed_duration_since(active.pointer.updated) < min_interval {
            tracing::debug!("check interval not elapsed; sync skipped");
            return SyncOutcome::TooSoon;
        }

        match self.attempt(&active, remote_base, now) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("sync attempt failed, keeping release {}: {err}", active.pointer.id);
                SyncOutcome::Failed
            }
        }
    }

    /// Steps FETCH_MANIFEST through ACTIVATE for an existing installation.
    fn attempt(
        &self,
        active: &ActiveRelease,
        remote_base: &str,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let url = join_url(remote_base, MANIFEST_ENDPOINT);
        let remote = self.manifests.fetch_manifest(&url)?;

        if remote.id == active.pointer.id {
            // Steady state: refresh the check timestamp only.
            store::save_pointer(&self.root, &active.pointer.id, now)?;
            tracing::debug!("release {} already up to date", active.pointer.id);
            return Ok(SyncOutcome::UpToDate);
        }

        let plan = plan::plan(&remote, &active.manifest);
        tracing::info!(
            "updating {} -> {}: {} reused, {} downloaded",
            active.pointer.id,
            remote.id,
            plan.reuse_count(),
            plan.download_count(),
        );

        let staging = install::stage_release(
            &self.root,
            &remote,
            &plan,
            &active.dir,
            remote_base,
            self.files,
        )?;
        let release = install::commit(&self.root, &remote.id, &staging)?;
        gc::collect(&self.root, &remote.id);
        self.activate(&release)?;
        store::save_pointer(&self.root, &remote.id, Utc::now())?;
        Ok(SyncOutcome::Updated)
    }

    /// Install release v0 from the embedded baseline.
    fn bootstrap(&self) -> Result<ReleaseId, SyncError> {
        let manifest = self.baseline.manifest()?;
        let staging = install::stage_baseline(&self.root, &manifest, self.baseline)?;
        let release = install::commit(&self.root, &manifest.id, &staging)?;
        self.activate(&release)?;
        store::save_pointer(&self.root, &manifest.id, Utc::now())?;
        Ok(manifest.id)
    }

    fn activate(&self, release: &Path) -> Result<(), SyncError> {
        let absolute = std::fs::canonicalize(release).map_err(|e| io_err(release, e))?;
        self.activator.set_content_root(&absolute)?;
        self.activator.persist_content_root()?;
        self.activator.reload()?;
        Ok(())
    }

    /// Pointer plus the manifest it points at. Either missing or unreadable
    /// collapses to `None`, which triggers bootstrap.
    fn load_active(&self) -> Option<ActiveRelease> {
        let pointer = store::load_pointer(&self.root)?;
        match store::load_release_manifest(&self.root, &pointer.id) {
            Ok(manifest) => {
                let dir = store::release_dir(&self.root, &pointer.id);
                Some(ActiveRelease {
                    pointer,
                    manifest,
                    dir,
                })
            }
            Err(err) => {
                tracing::warn!(
                    "active release {} unreadable, treating as fresh install: {err}",
                    pointer.id
                );
                None
            }
        }
    }
}
