//! Reconciliation of a local file set against a remote container listing.
//!
//! Every name in `local ∪ remote` lands in exactly one bucket:
//! 1. `new` — local only
//! 2. `deleted` — remote only
//! 3. `updated` — both, local mtime strictly after remote last-modified
//! 4. `unchanged` — both, local mtime at or before remote last-modified
//!
//! Local mtimes are resolved lazily, and only for names present on both
//! sides. A resolver failure aborts the whole computation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use webdeploy_core::{BlobName, RemoteListing};

/// Outcome of reconciling one local snapshot against one remote snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub new: BTreeSet<BlobName>,
    pub updated: BTreeSet<BlobName>,
    pub unchanged: BTreeSet<BlobName>,
    pub deleted: BTreeSet<BlobName>,
}

impl SyncPlan {
    /// Names to upload: new files first, then updated ones.
    pub fn to_upload(&self) -> impl Iterator<Item = &BlobName> {
        self.new.iter().chain(self.updated.iter())
    }

    /// Names to remove from the container.
    pub fn to_delete(&self) -> impl Iterator<Item = &BlobName> {
        self.deleted.iter()
    }

    pub fn upload_count(&self) -> usize {
        self.new.len() + self.updated.len()
    }

    /// True when the container already matches the source tree.
    pub fn is_noop(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Compute the upload/delete partition.
///
/// `local_modified` is called once for each name present in both `local` and
/// `remote`, and never for any other name.
pub fn reconcile<F, E>(
    local: &BTreeSet<BlobName>,
    remote: &RemoteListing,
    mut local_modified: F,
) -> Result<SyncPlan, E>
where
    F: FnMut(&BlobName) -> Result<DateTime<Utc>, E>,
{
    let mut plan = SyncPlan::default();

    for name in local {
        let Some(remote_modified) = remote.get(name) else {
            plan.new.insert(name.clone());
            continue;
        };
        // Equal timestamps count as unchanged.
        if local_modified(name)? > *remote_modified {
            plan.updated.insert(name.clone());
        } else {
            plan.unchanged.insert(name.clone());
        }
    }

    plan.deleted = remote
        .keys()
        .filter(|name| !local.contains(*name))
        .cloned()
        .collect();

    Ok(plan)
}
