//! Properties index for the directory-backed container.
//!
//! Persists a [`PropertiesFile`] JSON document at
//! `<container>/.webdeploy-properties.json`, mapping blob names to the
//! properties recorded at upload time. Writes use an atomic `.tmp` + rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use webdeploy_core::{BlobName, BlobProperties};

use crate::error::{io_err, StoreError};

/// File name of the index at the container root. Never listed as a blob.
pub const PROPERTIES_FILE_NAME: &str = ".webdeploy-properties.json";

/// Properties of one stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(flatten)]
    pub properties: BlobProperties,
    pub content_length: u64,
    /// Hex SHA-256 of the uploaded content.
    pub etag: String,
    pub uploaded_at: DateTime<Utc>,
}

/// On-disk properties index payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertiesFile {
    #[serde(default)]
    pub blobs: BTreeMap<BlobName, BlobRecord>,
}

/// Path to the index for a container rooted at `container`.
pub fn index_path_at(container: &Path) -> PathBuf {
    container.join(PROPERTIES_FILE_NAME)
}

/// Load the index. Returns an empty index if the file does not yet exist.
pub fn load_at(container: &Path) -> Result<PropertiesFile, StoreError> {
    let path = index_path_at(container);
    if !path.exists() {
        return Ok(PropertiesFile::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the index atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(container: &Path, index: &PropertiesFile) -> Result<(), StoreError> {
    let path = index_path_at(container);
    let json = serde_json::to_string_pretty(index)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}
