//! webdeploy core library — domain types, deploy configuration, errors.
//!
//! - [`types`] — blob names and remote object metadata
//! - [`config`] — `webdeploy.yaml` load / save / discovery
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{CachePolicy, DeployConfig, PurgeConfig, CONFIG_FILE_NAME, MAX_DELETE_BATCH};
pub use error::ConfigError;
pub use types::{BlobName, BlobProperties, RemoteListing, RemoteObject};
