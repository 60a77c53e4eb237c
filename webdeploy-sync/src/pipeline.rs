//! Shared deploy pipeline entrypoint used by the CLI.
//!
//! [`Deployment::init`] turns a resolved [`DeployConfig`] into a container
//! handle and an optional purger before any file is touched, so a missing
//! container or bad setting fails up front.

use std::path::Path;

use webdeploy_core::DeployConfig;

use crate::deploy::{self, DeployReport};
use crate::directory::DirectoryStore;
use crate::error::SyncError;
use crate::purge::{CachePurger, HttpPurger};
use crate::reconcile::SyncPlan;

/// A configured container plus its edge-cache purger.
pub struct Deployment {
    config: DeployConfig,
    store: DirectoryStore,
    purger: Option<HttpPurger>,
}

impl Deployment {
    /// Validate `config` and open its container.
    ///
    /// With `create_container` the container directory is created if missing;
    /// otherwise a missing directory is `StoreError::ContainerNotFound`.
    pub fn init(config: DeployConfig, create_container: bool) -> Result<Self, SyncError> {
        config.validate()?;
        let root = config
            .container
            .clone()
            .ok_or(SyncError::ContainerNotConfigured)?;
        let store = if create_container {
            DirectoryStore::create(root, config.page_size)?
        } else {
            DirectoryStore::open(root, config.page_size)?
        };
        let purger = config.purge.as_ref().map(HttpPurger::from_config);
        tracing::debug!(
            "container {} opened (purge {})",
            store.root().display(),
            if purger.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            config,
            store,
            purger,
        })
    }

    /// Drop the purger for this run.
    pub fn without_purge(mut self) -> Self {
        self.purger = None;
        self
    }

    pub fn store(&self) -> &DirectoryStore {
        &self.store
    }

    pub fn purge_enabled(&self) -> bool {
        self.purger.is_some()
    }

    /// Reconcile `source` against the container without changing anything.
    pub fn plan(&self, source: &Path) -> Result<SyncPlan, SyncError> {
        let (_, plan) = deploy::plan(source, &self.store, &self.config)?;
        Ok(plan)
    }

    /// Run the full deploy for `source`.
    pub fn run(&mut self, source: &Path, dry_run: bool) -> Result<DeployReport, SyncError> {
        let purger = self.purger.as_ref().map(|p| p as &dyn CachePurger);
        deploy::deploy(source, &mut self.store, purger, &self.config, dry_run)
    }
}
