//! `webdeploy init [--path <file>] [--container <dir>] [--purge-url <url>] [--force]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use webdeploy_core::{config, DeployConfig, PurgeConfig, CONFIG_FILE_NAME};

use crate::GlobalArgs;

/// Write a starter config file.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config. Defaults to `--config`, then ./webdeploy.yaml.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Container directory to record in the new config.
    #[arg(long, value_name = "DIR")]
    pub container: Option<PathBuf>,

    /// CDN purge endpoint to record in the new config.
    #[arg(long, value_name = "URL")]
    pub purge_url: Option<String>,

    /// Replace an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let path = self
            .path
            .or_else(|| global.config.clone())
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let cfg = DeployConfig {
            container: self.container,
            purge: self.purge_url.map(PurgeConfig::new),
            ..DeployConfig::default()
        };
        cfg.validate().context("invalid configuration")?;

        config::save_at(&path, &cfg, self.force)
            .with_context(|| format!("failed to write '{}'", path.display()))?;

        println!("✓ Wrote {}", path.display());
        if cfg.container.is_none() {
            println!("  Set `container:` before running `webdeploy sync`.");
        }
        Ok(())
    }
}
