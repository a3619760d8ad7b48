//! Garbage collection of superseded releases.
//!
//! Runs only after a successful commit, so deletion failures are cosmetic:
//! they are logged and skipped, never escalated.

use std::path::Path;

use skylift_core::ReleaseId;

use crate::store;

/// Delete every entry under `releases/` whose name is not `keep`.
///
/// Stale staging leftovers are swept up along with superseded releases.
/// Returns the number of entries removed.
pub fn collect(root: &Path, keep: &ReleaseId) -> usize {
    let dir = store::releases_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("gc: cannot read {}: {err}", dir.display());
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy() == keep.as_str() {
            continue;
        }
        let path = entry.path();
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                tracing::info!("gc: removed {}", path.display());
                removed += 1;
            }
            Err(err) => tracing::warn!("gc: skipping {}: {err}", path.display()),
        }
    }
    removed
}
