pub mod pack;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolve the local state root: explicit flag or `~/.skylift`.
pub fn state_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".skylift"))
}
