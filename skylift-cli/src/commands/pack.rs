//! `skylift pack` — publisher-side manifest generation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use skylift_core::ReleaseId;
use skylift_sync::snapshot_dir;

/// Arguments for `skylift pack`.
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Content directory to snapshot.
    pub dir: PathBuf,

    /// Release id for the generated manifest.
    #[arg(long)]
    pub id: String,

    /// Output file (defaults to <dir>/manifest.json).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl PackArgs {
    pub fn run(self) -> Result<()> {
        let id = ReleaseId::new(self.id).context("invalid release id")?;
        let manifest = snapshot_dir(&self.dir, id)
            .with_context(|| format!("could not snapshot {}", self.dir.display()))?;

        let out = self.out.unwrap_or_else(|| self.dir.join("manifest.json"));
        let json = manifest.to_json().context("could not serialize manifest")?;
        std::fs::write(&out, json)
            .with_context(|| format!("could not write {}", out.display()))?;

        println!(
            "{} {} ({} files) -> {}",
            "packed".green().bold(),
            manifest.id,
            manifest.files.len(),
            out.display()
        );
        Ok(())
    }
}
