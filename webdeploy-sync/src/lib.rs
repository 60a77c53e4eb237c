//! # webdeploy-sync
//!
//! Reconciliation and deploy execution.
//!
//! Call [`reconcile::reconcile`] to classify local files against a container
//! listing, or [`pipeline::Deployment`] to scan, upload, prune and purge in
//! one run.

pub mod deploy;
pub mod directory;
pub mod error;
pub mod local;
pub mod pipeline;
pub mod properties;
pub mod purge;
pub mod reconcile;
pub mod store;

pub use deploy::{deploy, DeployAction, DeployReport, UploadReason};
pub use directory::DirectoryStore;
pub use error::{PurgeError, StoreError, SyncError};
pub use pipeline::Deployment;
pub use purge::{CachePurger, HttpPurger};
pub use reconcile::{reconcile, SyncPlan};
pub use store::{list_all, ListPage, RemoteStore};
