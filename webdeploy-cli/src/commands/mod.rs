//! Subcommand implementations.

pub mod init;
pub mod plan;
pub mod purge;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webdeploy_core::{config, DeployConfig, PurgeConfig};

use crate::GlobalArgs;

/// Per-run overrides layered on top of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Container directory to deploy into.
    #[arg(long, env = "WEBDEPLOY_CONTAINER", value_name = "DIR")]
    pub container: Option<PathBuf>,

    /// CDN purge endpoint.
    #[arg(long, env = "WEBDEPLOY_PURGE_URL", value_name = "URL")]
    pub purge_url: Option<String>,

    /// Maximum names per delete request (1-256).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Deploy dot-prefixed files and directories too.
    #[arg(long)]
    pub include_hidden: bool,
}

impl TargetArgs {
    /// Resolve the config file, then apply these overrides.
    pub fn load(&self, global: &GlobalArgs) -> Result<DeployConfig> {
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let (mut cfg, source) = config::resolve(global.config.as_deref(), &cwd)
            .context("failed to load webdeploy config")?;
        match &source {
            Some(path) => tracing::debug!("using config {}", path.display()),
            None => tracing::debug!("no config file found; using defaults"),
        }

        if let Some(container) = &self.container {
            cfg.container = Some(container.clone());
        }
        if let Some(url) = &self.purge_url {
            match cfg.purge.as_mut() {
                Some(purge) => purge.url = url.clone(),
                None => cfg.purge = Some(PurgeConfig::new(url.clone())),
            }
        }
        if let Some(size) = self.batch_size {
            cfg.delete_batch_size = size;
        }
        if self.include_hidden {
            cfg.include_hidden = true;
        }
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}
