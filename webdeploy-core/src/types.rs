//! Domain types shared by the reconciler, the stores and the CLI.
//!
//! The join key between a local file and a remote object is its [`BlobName`]:
//! a `/`-separated relative path. Local paths are converted once at scan time
//! so the comparison is a plain byte-equality on every platform.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of an object in the remote container (a relative path with `/`
/// separators).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobName(pub String);

impl BlobName {
    /// Build a blob name from a path relative to the source root.
    ///
    /// Returns `None` for empty paths, paths that escape the root (`..`,
    /// absolute or prefixed paths) and non-UTF-8 components.
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension of the final segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        // ".htaccess" has no extension.
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext)
    }

    /// Segments of the name, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BlobName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BlobName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Remote state
// ---------------------------------------------------------------------------

/// One object as reported by a container listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub name: BlobName,
    pub last_modified: DateTime<Utc>,
}

/// Fully drained remote listing: name → last-modified.
pub type RemoteListing = BTreeMap<BlobName, DateTime<Utc>>;

/// Properties applied to an object on upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlobProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
