//! Collaborator traits and the `ureq`-backed production fetcher.
//!
//! The engine consumes the host environment through these seams; tests
//! substitute in-memory fakes, and the CLI wires the real implementations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use skylift_core::ChecksumManifest;

use crate::error::{io_err, SyncError};

/// Remote manifest document name, resolved against the remote base URL.
pub const MANIFEST_ENDPOINT: &str = "manifest.json";

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Host runtime gate: sync is skipped entirely outside a native runtime.
pub trait PlatformGate {
    fn is_native_runtime(&self) -> bool;
}

/// Fetches and parses the remote manifest document.
pub trait ManifestFetcher {
    fn fetch_manifest(&self, url: &str) -> Result<ChecksumManifest, SyncError>;
}

/// Per-file transfer primitives. `Sync` because the installer dispatches
/// file operations concurrently against a shared fetcher.
pub trait FileFetcher: Sync {
    /// Stream `url` into `dest`.
    fn download(&self, url: &str, dest: &Path) -> Result<(), SyncError>;

    /// Byte-for-byte local copy, no network.
    fn copy(&self, src: &Path, dest: &Path) -> Result<(), SyncError>;
}

/// Points the serving layer at a newly committed release directory.
pub trait Activator {
    fn set_content_root(&self, root: &Path) -> Result<(), SyncError>;
    fn persist_content_root(&self) -> Result<(), SyncError>;
    fn reload(&self) -> Result<(), SyncError>;
}

/// Supplies the bootstrap manifest and file bytes from a bundled source.
///
/// Bytes handed out here are expected to be already clean; any
/// serving-environment markup stripping happens on the host side.
pub trait EmbeddedBaseline {
    fn manifest(&self) -> Result<ChecksumManifest, SyncError>;
    fn file(&self, path: &str) -> Result<Vec<u8>, SyncError>;
}

// ---------------------------------------------------------------------------
// URL helper
// ---------------------------------------------------------------------------

/// Join a relative manifest path onto the remote base URL.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

// ---------------------------------------------------------------------------
// HttpFetcher — production ManifestFetcher + FileFetcher over ureq
// ---------------------------------------------------------------------------

/// HTTP fetcher with bounded connect/read timeouts.
///
/// Timeout expiry surfaces as an ordinary [`SyncError::Fetch`]; there is no
/// other cancellation mechanism.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .build();
        Self { agent }
    }

    fn get(&self, url: &str) -> Result<ureq::Response, SyncError> {
        self.agent.get(url).call().map_err(|e| SyncError::Fetch {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

impl ManifestFetcher for HttpFetcher {
    fn fetch_manifest(&self, url: &str) -> Result<ChecksumManifest, SyncError> {
        let body = self
            .get(url)?
            .into_string()
            .map_err(|e| SyncError::Fetch {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(ChecksumManifest::parse(&body)?)
    }
}

impl FileFetcher for HttpFetcher {
    fn download(&self, url: &str, dest: &Path) -> Result<(), SyncError> {
        let response = self.get(url)?;
        let mut reader = response.into_reader();
        let mut file = fs::File::create(dest).map_err(|e| io_err(dest, e))?;
        io::copy(&mut reader, &mut file).map_err(|e| SyncError::Fetch {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<(), SyncError> {
        fs::copy(src, dest).map_err(|e| io_err(src, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Simple host-side implementations
// ---------------------------------------------------------------------------

/// A gate that always reports a native runtime (CLI / server hosts).
pub struct AlwaysNative;

impl PlatformGate for AlwaysNative {
    fn is_native_runtime(&self) -> bool {
        true
    }
}

/// Baseline backed by a local directory containing `manifest.json` plus the
/// files it lists.
pub struct DirBaseline {
    dir: PathBuf,
}

impl DirBaseline {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl EmbeddedBaseline for DirBaseline {
    fn manifest(&self) -> Result<ChecksumManifest, SyncError> {
        let path = self.dir.join(MANIFEST_ENDPOINT);
        let contents = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(ChecksumManifest::parse(&contents)?)
    }

    fn file(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        let full = self.dir.join(path);
        fs::read(&full).map_err(|e| io_err(&full, e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
