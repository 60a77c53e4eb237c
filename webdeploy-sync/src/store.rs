//! Remote container interface.

use std::path::Path;

use webdeploy_core::{BlobName, BlobProperties, RemoteListing, RemoteObject};

use crate::error::StoreError;

/// One page of a container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<RemoteObject>,
    /// Marker to request the next page; `None` on the last page.
    pub next_marker: Option<String>,
}

/// A blob container the deploy pipeline can list, write and prune.
pub trait RemoteStore {
    /// Return the page of objects following `marker` (`None` for the first page).
    fn list_page(&self, marker: Option<&str>) -> Result<ListPage, StoreError>;

    /// Upload `source` as `name`, replacing any existing object.
    fn upload(
        &mut self,
        source: &Path,
        name: &BlobName,
        properties: &BlobProperties,
    ) -> Result<(), StoreError>;

    /// Delete every name in `names`. Missing objects are not an error.
    fn delete_batch(&mut self, names: &[BlobName]) -> Result<(), StoreError>;
}

/// List the whole container, following markers until the last page.
pub fn list_all(store: &dyn RemoteStore) -> Result<RemoteListing, StoreError> {
    let mut listing = RemoteListing::new();
    let mut marker: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = store.list_page(marker.as_deref())?;
        pages += 1;
        for object in page.objects {
            if listing.insert(object.name.clone(), object.last_modified).is_some() {
                tracing::warn!("listing returned '{}' more than once", object.name);
            }
        }
        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }
    tracing::debug!("listed {} remote object(s) in {pages} page(s)", listing.len());
    Ok(listing)
}
