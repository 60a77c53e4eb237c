//! Error types for webdeploy-sync.

use std::path::PathBuf;

use thiserror::Error;

use webdeploy_core::{BlobName, ConfigError};

/// Errors raised by a [`RemoteStore`](crate::store::RemoteStore) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the container directory failed.
    #[error("failed to walk container at {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Properties index JSON could not be read or written.
    #[error("properties index JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("container not found at {path}")]
    ContainerNotFound { path: PathBuf },

    /// The name cannot be stored (escapes the container, reserved, …).
    #[error("invalid blob name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Errors raised by a [`CachePurger`](crate::purge::CachePurger).
#[derive(Debug, Error)]
pub enum PurgeError {
    #[error("purge request to {url} failed: {message}")]
    Http { url: String, message: String },
}

/// All errors that can arise from a deploy run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local source tree could not be enumerated.
    #[error("failed to list local files under {path}: {message}")]
    LocalListing { path: PathBuf, message: String },

    /// The remote container could not be listed.
    #[error("failed to list remote container: {0}")]
    RemoteListing(#[source] StoreError),

    /// A local modification time could not be read for comparison.
    #[error("failed to read modification time of {path}: {source}")]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to upload '{name}': {source}")]
    Upload {
        name: BlobName,
        #[source]
        source: StoreError,
    },

    /// A delete batch failed; earlier batches have already been applied.
    #[error("failed to delete batch of {count} object(s): {source}")]
    Delete {
        count: usize,
        #[source]
        source: StoreError,
    },

    #[error("cache purge failed: {0}")]
    Purge(#[from] PurgeError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The container could not be opened.
    #[error("failed to open container: {0}")]
    Container(#[from] StoreError),

    /// No container root was configured.
    #[error("no container configured; set `container` in webdeploy.yaml or pass --container")]
    ContainerNotConfigured,
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
