//! Directory-backed blob container.
//!
//! Blobs live as plain files under the container root (a mounted share or a
//! web server's document root), so a blob name maps directly onto a relative
//! path. A blob's last-modified time is its file's mtime, which is the moment
//! it was uploaded. Upload properties are kept in the
//! [properties index](crate::properties).
//!
//! A listing walks the directory once, when its first page is requested, and
//! serves later pages from that sorted snapshot. Uploads and deletes drop the
//! snapshot.

use std::cell::RefCell;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use webdeploy_core::{BlobName, BlobProperties, RemoteObject};

use crate::error::{io_err, StoreError};
use crate::properties::{self, BlobRecord, PropertiesFile, PROPERTIES_FILE_NAME};
use crate::store::{ListPage, RemoteStore};

/// Suffix of the sibling file an upload is staged in before the rename.
pub const TMP_SUFFIX: &str = ".webdeploy.tmp";

/// A container rooted at a local directory.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    page_size: usize,
    index: PropertiesFile,
    /// Sorted blob names of the listing in progress.
    snapshot: RefCell<Option<Vec<(BlobName, PathBuf)>>>,
}

impl DirectoryStore {
    /// Open an existing container directory.
    pub fn open(root: impl Into<PathBuf>, page_size: usize) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::ContainerNotFound { path: root });
        }
        let index = properties::load_at(&root)?;
        Ok(Self {
            root,
            page_size: page_size.max(1),
            index,
            snapshot: RefCell::new(None),
        })
    }

    /// Create the container directory if needed, then open it.
    pub fn create(root: impl Into<PathBuf>, page_size: usize) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        Self::open(root, page_size)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Properties recorded when `name` was last uploaded.
    pub fn record(&self, name: &BlobName) -> Option<&BlobRecord> {
        self.index.blobs.get(name)
    }

    fn blob_path(&self, name: &BlobName) -> Result<PathBuf, StoreError> {
        let invalid = |reason| StoreError::InvalidName {
            name: name.0.clone(),
            reason,
        };
        if name.as_str().is_empty() {
            return Err(invalid("empty name"));
        }
        if name.as_str().contains('\\') {
            return Err(invalid("backslash in name"));
        }
        if name
            .segments()
            .any(|s| s.is_empty() || s == "." || s == "..")
        {
            return Err(invalid("empty or relative path segment"));
        }
        let reserved_root = name.segments().next().is_some_and(is_index_file);
        if reserved_root || name.as_str().ends_with(TMP_SUFFIX) {
            return Err(invalid("reserved by the container"));
        }
        Ok(crate::local::path_of(&self.root, name))
    }

    /// Every blob in the container, sorted by name.
    fn all_names(&self) -> Result<Vec<(BlobName, PathBuf)>, StoreError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Walk {
                path: self.root.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if file_name.ends_with(TMP_SUFFIX) || (entry.depth() == 1 && is_index_file(&file_name))
            {
                continue;
            }
            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            match BlobName::from_relative_path(relative) {
                Some(name) => names.push((name, entry.into_path())),
                None => tracing::warn!("skipping non UTF-8 blob path {}", entry.path().display()),
            }
        }
        names.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(names)
    }

    fn remove_blob(&mut self, name: &BlobName) -> Result<(), StoreError> {
        let path = self.blob_path(name)?;
        // A directory (or a file parent) at the path means the blob is gone.
        if std::fs::symlink_metadata(&path).is_ok_and(|meta| !meta.is_dir()) {
            match std::fs::remove_file(&path) {
                Ok(()) => self.prune_empty_parents(&path),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(io_err(&path, err)),
            }
        } else {
            tracing::debug!("already absent: {name}");
        }
        self.index.blobs.remove(name);
        Ok(())
    }

    /// Remove blobs whose file type collides with an upload to `dest`: a file
    /// blob sitting where `dest` needs a parent directory, or a directory of
    /// blobs sitting where `dest` needs a file. A local tree never holds both
    /// shapes, so the removed blobs are stale.
    fn clear_path_conflicts(&mut self, name: &BlobName, dest: &Path) -> Result<(), StoreError> {
        let segments: Vec<&str> = name.segments().collect();
        let parents = segments.len().saturating_sub(1);
        let mut ancestor = self.root.clone();
        for (depth, segment) in segments.iter().take(parents).enumerate() {
            ancestor.push(segment);
            if std::fs::symlink_metadata(&ancestor).is_ok_and(|meta| !meta.is_dir()) {
                let blocking = BlobName::from(segments[..=depth].join("/"));
                tracing::info!("removing {blocking}: a directory is needed for {name}");
                std::fs::remove_file(&ancestor).map_err(|e| io_err(&ancestor, e))?;
                self.index.blobs.remove(&blocking);
                // Nothing can exist below a file.
                break;
            }
        }

        if std::fs::symlink_metadata(dest).is_ok_and(|meta| meta.is_dir()) {
            let prefix = format!("{name}/");
            tracing::info!("removing blobs under {prefix}: a file is needed for {name}");
            std::fs::remove_dir_all(dest).map_err(|e| io_err(dest, e))?;
            self.index
                .blobs
                .retain(|blob, _| !blob.as_str().starts_with(&prefix));
        }
        Ok(())
    }

    /// Remove directories left empty by a delete, stopping at the root.
    fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.root || std::fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

impl RemoteStore for DirectoryStore {
    fn list_page(&self, marker: Option<&str>) -> Result<ListPage, StoreError> {
        let mut snapshot = self.snapshot.borrow_mut();
        let names = match snapshot.take() {
            Some(names) if marker.is_some() => names,
            _ => self.all_names()?,
        };
        let names = snapshot.insert(names);
        let start = match marker {
            Some(marker) => names.partition_point(|(name, _)| name.as_str() <= marker),
            None => 0,
        };
        let end = (start + self.page_size).min(names.len());

        let mut objects = Vec::with_capacity(end - start);
        for (name, path) in &names[start..end] {
            let modified = std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map_err(|e| io_err(path, e))?;
            objects.push(RemoteObject {
                name: name.clone(),
                last_modified: DateTime::<Utc>::from(modified),
            });
        }

        let next_marker = (end < names.len()).then(|| names[end - 1].0 .0.clone());
        Ok(ListPage {
            objects,
            next_marker,
        })
    }

    fn upload(
        &mut self,
        source: &Path,
        name: &BlobName,
        properties: &BlobProperties,
    ) -> Result<(), StoreError> {
        let dest = self.blob_path(name)?;
        let content = std::fs::read(source).map_err(|e| io_err(source, e))?;
        let etag = hex::encode(Sha256::digest(&content));

        self.snapshot.get_mut().take();
        self.clear_path_conflicts(name, &dest)?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", dest.display()));
        std::fs::write(&tmp, &content).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &dest) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&dest, e));
        }

        self.index.blobs.insert(
            name.clone(),
            BlobRecord {
                properties: properties.clone(),
                content_length: content.len() as u64,
                etag,
                uploaded_at: Utc::now(),
            },
        );
        properties::save_at(&self.root, &self.index)
    }

    fn delete_batch(&mut self, names: &[BlobName]) -> Result<(), StoreError> {
        self.snapshot.get_mut().take();
        let result = names.iter().try_for_each(|name| self.remove_blob(name));
        // Persist whatever was removed, even when the batch stopped early.
        properties::save_at(&self.root, &self.index)?;
        result
    }
}

/// The properties index and its staging file, both at the container root.
fn is_index_file(name: &str) -> bool {
    name == PROPERTIES_FILE_NAME || name.strip_prefix(PROPERTIES_FILE_NAME) == Some(".tmp")
}
