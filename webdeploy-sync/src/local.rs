//! Local source tree enumeration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::{DirEntry, WalkDir};

use webdeploy_core::BlobName;

use crate::SyncError;

/// Snapshot of the regular files under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTree {
    pub root: PathBuf,
    pub files: BTreeSet<BlobName>,
}

impl LocalTree {
    /// Absolute path of `name` under the root.
    pub fn path_of(&self, name: &BlobName) -> PathBuf {
        path_of(&self.root, name)
    }

    /// Modification time of `name`.
    pub fn modified_at(&self, name: &BlobName) -> Result<DateTime<Utc>, SyncError> {
        modified_at(&self.root, name)
    }
}

/// Recursively list regular files under `root`. Directories are not listed;
/// symlinks are followed.
///
/// Dot-prefixed files and directories are skipped unless `include_hidden`.
pub fn scan(root: &Path, include_hidden: bool) -> Result<LocalTree, SyncError> {
    if !root.is_dir() {
        return Err(SyncError::LocalListing {
            path: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = BTreeSet::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| include_hidden || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::LocalListing {
            path: e.path().unwrap_or(root).to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        let name = BlobName::from_relative_path(relative).ok_or_else(|| {
            SyncError::LocalListing {
                path: entry.path().to_path_buf(),
                message: "file name is not valid UTF-8".to_string(),
            }
        })?;
        files.insert(name);
    }

    tracing::debug!("scanned {} local file(s) under {}", files.len(), root.display());
    Ok(LocalTree {
        root: root.to_path_buf(),
        files,
    })
}

/// `<root>/<segment>/…` for a blob name. Pure, no I/O.
pub fn path_of(root: &Path, name: &BlobName) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(name.segments());
    path
}

/// Modification time of the local file backing `name`.
pub fn modified_at(root: &Path, name: &BlobName) -> Result<DateTime<Utc>, SyncError> {
    let path = path_of(root, name);
    let modified = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .map_err(|source| SyncError::Timestamp {
            path: path.clone(),
            source,
        })?;
    Ok(DateTime::<Utc>::from(modified))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
