//! `webdeploy sync <source>` — upload, prune and purge.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webdeploy_sync::{DeployAction, DeployReport, Deployment, UploadReason};

use super::TargetArgs;
use crate::GlobalArgs;

/// Arguments for `webdeploy sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Local directory holding the built site.
    pub source: PathBuf,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would change without touching the container or CDN.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the CDN purge even if one is configured.
    #[arg(long)]
    pub no_purge: bool,

    /// Create the container directory if it does not exist.
    #[arg(long)]
    pub create: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let cfg = self.target.load(global)?;
        let mut deployment = Deployment::init(cfg, self.create && !self.dry_run)
            .context("failed to open container")?;
        if self.no_purge {
            deployment = deployment.without_purge();
        }

        let report = deployment
            .run(&self.source, self.dry_run)
            .with_context(|| format!("sync failed for '{}'", self.source.display()))?;
        print_results(&report);
        Ok(())
    }
}

fn print_results(report: &DeployReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let uploads = report.upload_count();
    let deletes = report.delete_count();

    if uploads == 0 && deletes == 0 {
        println!(
            "{prefix}✓ nothing to do ({} unchanged)",
            report.unchanged_count()
        );
    } else {
        println!(
            "{prefix}✓ synced ({uploads} uploaded, {deletes} deleted in {} batch(es), {} unchanged)",
            report.delete_batches,
            report.unchanged_count()
        );
    }

    for action in &report.actions {
        match action {
            DeployAction::Uploaded { name, reason } => {
                println!("  ↑  {name}{}", reason_suffix(*reason))
            }
            DeployAction::WouldUpload { name, reason } => {
                println!("  ~  {name}{}", reason_suffix(*reason))
            }
            DeployAction::Deleted { name } => println!("  ✗  {name}"),
            DeployAction::WouldDelete { name } => println!("  -  {name}"),
            DeployAction::Unchanged { .. } => {}
        }
    }

    if report.purged {
        println!("✓ CDN purge requested");
    }
}

fn reason_suffix(reason: UploadReason) -> &'static str {
    match reason {
        UploadReason::New => " (new)",
        UploadReason::Updated => " (updated)",
    }
}
