//! # skylift-core
//!
//! Domain types for the Skylift release engine:
//! - [`manifest`] — checksum manifest model, release ids, strict wire parsing
//! - [`error`] — [`ManifestError`]

pub mod error;
pub mod manifest;

pub use error::ManifestError;
pub use manifest::{
    ActivePointer, ChecksumManifest, FileEntry, ReleaseId, RELEASE_MANIFEST_FILE,
};
