//! Deploy execution.
//!
//! ## `deploy` — run order
//!
//! 1. Scan the source tree.
//! 2. Drain the container listing.
//! 3. Reconcile (mtimes resolved only for names present on both sides).
//! 4. Upload new blobs, then updated blobs.
//! 5. Delete stale blobs in batches of `delete_batch_size`.
//! 6. Purge the edge cache once, if a purger was supplied.
//!
//! In dry-run mode steps 4–6 are only reported. Nothing here is atomic across
//! the run; after a failure, running again recomputes from the current
//! container state.

use std::path::Path;

use webdeploy_core::{BlobName, DeployConfig, MAX_DELETE_BATCH};

use crate::error::SyncError;
use crate::local::{self, LocalTree};
use crate::purge::CachePurger;
use crate::reconcile::{reconcile, SyncPlan};
use crate::store::{list_all, RemoteStore};

// ---------------------------------------------------------------------------
// Deploy report
// ---------------------------------------------------------------------------

/// Why a blob is being uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReason {
    /// Not present in the container.
    New,
    /// Local file modified after the container copy.
    Updated,
}

/// Outcome for an individual blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployAction {
    Uploaded { name: BlobName, reason: UploadReason },
    /// Dry-run: the blob *would* have been uploaded.
    WouldUpload { name: BlobName, reason: UploadReason },
    Deleted { name: BlobName },
    /// Dry-run: the blob *would* have been deleted.
    WouldDelete { name: BlobName },
    /// Container copy is at least as recent as the local file.
    Unchanged { name: BlobName },
}

/// Outcome of a deploy run.
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub actions: Vec<DeployAction>,
    /// Delete requests issued (or that would be issued).
    pub delete_batches: usize,
    pub purged: bool,
    pub dry_run: bool,
}

impl DeployReport {
    pub fn upload_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    DeployAction::Uploaded { .. } | DeployAction::WouldUpload { .. }
                )
            })
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    DeployAction::Deleted { .. } | DeployAction::WouldDelete { .. }
                )
            })
            .count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, DeployAction::Unchanged { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Snapshot both sides and reconcile them. Mutates nothing.
pub fn plan(
    source: &Path,
    store: &dyn RemoteStore,
    config: &DeployConfig,
) -> Result<(LocalTree, SyncPlan), SyncError> {
    let tree = local::scan(source, config.include_hidden)?;
    let remote = list_all(store).map_err(SyncError::RemoteListing)?;
    let plan = reconcile(&tree.files, &remote, |name| tree.modified_at(name))?;
    tracing::info!(
        "plan: {} new, {} updated, {} unchanged, {} to delete",
        plan.new.len(),
        plan.updated.len(),
        plan.unchanged.len(),
        plan.deleted.len()
    );
    Ok((tree, plan))
}

// ---------------------------------------------------------------------------
// deploy
// ---------------------------------------------------------------------------

/// Make the container match `source`, then purge.
pub fn deploy(
    source: &Path,
    store: &mut dyn RemoteStore,
    purger: Option<&dyn CachePurger>,
    config: &DeployConfig,
    dry_run: bool,
) -> Result<DeployReport, SyncError> {
    config.validate()?;
    let (tree, plan) = plan(source, store, config)?;

    let mut report = DeployReport {
        dry_run,
        ..DeployReport::default()
    };

    let uploads = plan
        .new
        .iter()
        .map(|name| (name, UploadReason::New))
        .chain(plan.updated.iter().map(|name| (name, UploadReason::Updated)));
    for (name, reason) in uploads {
        if dry_run {
            tracing::info!("[dry-run] would upload: {name}");
            report.actions.push(DeployAction::WouldUpload {
                name: name.clone(),
                reason,
            });
            continue;
        }
        tracing::info!("uploading {name}");
        let properties = config.cache_control.properties_for(name);
        store
            .upload(&tree.path_of(name), name, &properties)
            .map_err(|source| SyncError::Upload {
                name: name.clone(),
                source,
            })?;
        report.actions.push(DeployAction::Uploaded {
            name: name.clone(),
            reason,
        });
    }

    for name in &plan.unchanged {
        tracing::debug!("unchanged: {name}");
        report
            .actions
            .push(DeployAction::Unchanged { name: name.clone() });
    }

    let stale: Vec<BlobName> = plan.to_delete().cloned().collect();
    if dry_run {
        for name in stale.iter() {
            tracing::info!("[dry-run] would delete: {name}");
        }
        report.delete_batches = stale.chunks(batch_size(config)).count();
        report.actions.extend(
            stale
                .into_iter()
                .map(|name| DeployAction::WouldDelete { name }),
        );
    } else {
        report.delete_batches = delete_in_batches(store, &stale, batch_size(config))?;
        report
            .actions
            .extend(stale.into_iter().map(|name| DeployAction::Deleted { name }));
    }

    if let Some(purger) = purger {
        let paths = purge_paths(config);
        if dry_run {
            tracing::info!("[dry-run] would purge: {}", paths.join(", "));
        } else {
            tracing::info!("purging edge cache: {}", paths.join(", "));
            purger.purge(&paths)?;
            report.purged = true;
        }
    }

    Ok(report)
}

/// Delete `names` in requests of at most `batch_size`. Returns the number of
/// requests issued.
pub fn delete_in_batches(
    store: &mut dyn RemoteStore,
    names: &[BlobName],
    batch_size: usize,
) -> Result<usize, SyncError> {
    let mut batches = 0;
    for chunk in names.chunks(batch_size.clamp(1, MAX_DELETE_BATCH)) {
        for name in chunk {
            tracing::info!("deleting {name}");
        }
        store
            .delete_batch(chunk)
            .map_err(|source| SyncError::Delete {
                count: chunk.len(),
                source,
            })?;
        batches += 1;
    }
    Ok(batches)
}

fn batch_size(config: &DeployConfig) -> usize {
    config.delete_batch_size.clamp(1, MAX_DELETE_BATCH)
}

fn purge_paths(config: &DeployConfig) -> Vec<String> {
    config
        .purge
        .as_ref()
        .map(|purge| purge.paths.clone())
        .unwrap_or_else(|| vec!["/*".to_string()])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
