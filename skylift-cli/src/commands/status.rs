//! `skylift status` — show the active release and last check time.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::Colorize;

use skylift_sync::store;

use super::state_root;

/// Arguments for `skylift status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Local state root (defaults to ~/.skylift).
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let root = state_root(self.root)?;

        let Some(pointer) = store::load_pointer(&root) else {
            println!("No active release. Run `skylift sync` first.");
            return Ok(());
        };

        let age = Utc::now()
            .signed_duration_since(pointer.updated)
            .num_seconds()
            .max(0) as u64;
        println!(
            "active release: {}  (checked {} ago)",
            pointer.id.as_str().green().bold(),
            format_seconds(age)
        );

        match store::load_release_manifest(&root, &pointer.id) {
            Ok(manifest) => println!(
                "files: {}  generated: {}",
                manifest.files.len(),
                manifest.generated_at.to_rfc3339()
            ),
            Err(err) => println!("{}: {err}", "release manifest unreadable".red()),
        }
        Ok(())
    }
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}
