//! `skylift sync` — run one end-to-end update attempt.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use skylift_sync::{
    store, Activator, AlwaysNative, DirBaseline, HttpFetcher, SyncEngine, SyncError, SyncOutcome,
};

use super::state_root;

/// Arguments for `skylift sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote base URL the manifest and files are fetched from.
    #[arg(long)]
    pub remote: String,

    /// Directory holding the embedded baseline (manifest.json + files),
    /// installed on first run.
    #[arg(long)]
    pub baseline: PathBuf,

    /// Minimum seconds between remote checks.
    #[arg(long, default_value_t = 3600)]
    pub interval: u64,

    /// Local state root (defaults to ~/.skylift).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// HTTP connect timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// HTTP read timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub read_timeout: u64,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let root = state_root(self.root)?;
        let fetcher = HttpFetcher::new(
            Duration::from_secs(self.connect_timeout),
            Duration::from_secs(self.read_timeout),
        );
        let baseline = DirBaseline::new(&self.baseline);
        let activator = LogActivator;
        let gate = AlwaysNative;

        let engine = SyncEngine::new(&root, &gate, &fetcher, &fetcher, &activator, &baseline);
        let outcome = engine.sync_outcome(&self.remote, Duration::from_secs(self.interval));

        let active = store::load_pointer(&root)
            .map(|p| p.id.as_str().to_owned())
            .unwrap_or_else(|| "none".to_owned());
        match outcome {
            SyncOutcome::Bootstrapped => {
                println!("{} baseline release {active}", "bootstrapped".green().bold())
            }
            SyncOutcome::Updated => println!("{} to release {active}", "updated".green().bold()),
            SyncOutcome::UpToDate => println!("{} at release {active}", "up to date".cyan()),
            SyncOutcome::TooSoon => println!("{} (interval not elapsed)", "skipped".yellow()),
            SyncOutcome::Skipped => println!("{} (not a native runtime)", "skipped".yellow()),
            SyncOutcome::Failed => println!(
                "{}; keeping release {active}",
                "sync failed".red().bold()
            ),
        }
        Ok(())
    }
}

/// Activator for a plain CLI host: there is no serving layer to reload, so
/// activation is just visibility.
struct LogActivator;

impl Activator for LogActivator {
    fn set_content_root(&self, root: &Path) -> Result<(), SyncError> {
        tracing::info!("content root -> {}", root.display());
        Ok(())
    }

    fn persist_content_root(&self) -> Result<(), SyncError> {
        Ok(())
    }

    fn reload(&self) -> Result<(), SyncError> {
        Ok(())
    }
}
