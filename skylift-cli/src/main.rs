//! Skylift — versioned content-bundle synchronization CLI.
//!
//! # Usage
//!
//! ```text
//! skylift sync --remote <URL> --baseline <dir> [--interval <secs>] [--root <dir>]
//! skylift status [--root <dir>]
//! skylift pack <dir> --id <release-id> [--out <file>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{pack::PackArgs, status::StatusArgs, sync::SyncArgs};

#[derive(Parser, Debug)]
#[command(
    name = "skylift",
    version,
    about = "Pull versioned content bundles and keep an atomically-swappable local copy",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one sync attempt against the remote bundle server.
    Sync(SyncArgs),

    /// Show the active release and last check time.
    Status(StatusArgs),

    /// Generate a manifest.json for a content directory (publisher side).
    Pack(PackArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Pack(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
