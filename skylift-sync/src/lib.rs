//! # skylift-sync
//!
//! Release lifecycle engine: manifest diffing, reuse-vs-download
//! reconciliation, staged atomic installation, garbage collection, and the
//! end-to-end sync orchestrator.
//!
//! Build a [`SyncEngine`] with the collaborator implementations for your
//! host and call [`SyncEngine::sync`]; it returns `true` iff a new release
//! was installed and activated, and never propagates internal failures.

pub mod engine;
pub mod error;
pub mod fetch;
pub mod gc;
pub mod install;
pub mod plan;
pub mod snapshot;
pub mod store;

pub use engine::{SyncEngine, SyncOutcome};
pub use error::SyncError;
pub use fetch::{
    Activator, AlwaysNative, DirBaseline, EmbeddedBaseline, FileFetcher, HttpFetcher,
    ManifestFetcher, PlatformGate,
};
pub use plan::{FileOp, ReconcilePlan};
pub use snapshot::snapshot_dir;
