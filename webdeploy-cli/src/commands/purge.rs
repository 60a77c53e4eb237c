//! `webdeploy purge` — invalidate the CDN without deploying.

use anyhow::{Context, Result};
use clap::Args;

use webdeploy_sync::{CachePurger, HttpPurger};

use super::TargetArgs;
use crate::GlobalArgs;

/// Arguments for `webdeploy purge`.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl PurgeArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let cfg = self.target.load(global)?;
        let purge = cfg
            .purge
            .context("no purge endpoint configured; set `purge.url` or --purge-url")?;
        let purger = HttpPurger::from_config(&purge);
        purger
            .purge(&purge.paths)
            .with_context(|| format!("purge via {} failed", purger.url()))?;
        println!("✓ Purged {}", purge.paths.join(", "));
        Ok(())
    }
}
