//! webdeploy — publish a static site directory to a blob container.
//!
//! # Usage
//!
//! ```text
//! webdeploy init [--path <file>] [--container <dir>] [--purge-url <url>] [--force]
//! webdeploy plan <source> [--json]
//! webdeploy sync <source> [--dry-run] [--no-purge]
//! webdeploy purge
//! ```
//!
//! Global: `--config <file>` (or `WEBDEPLOY_CONFIG`), `-v`/`-vv` for more log
//! output on stderr. `RUST_LOG` overrides `-v`.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, plan::PlanArgs, purge::PurgeArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "webdeploy",
    version,
    about = "Sync a static site directory to a blob container and purge the CDN",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options accepted by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file to use instead of discovering `webdeploy.yaml`.
    #[arg(long, global = true, env = "WEBDEPLOY_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter webdeploy.yaml.
    Init(InitArgs),

    /// Show what a sync would upload and delete.
    Plan(PlanArgs),

    /// Upload new and updated files, delete stale blobs, then purge.
    Sync(SyncArgs),

    /// Purge the configured CDN paths without deploying.
    Purge(PurgeArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    match cli.command {
        Commands::Init(args) => args.run(&cli.global),
        Commands::Plan(args) => args.run(&cli.global),
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Purge(args) => args.run(&cli.global),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
