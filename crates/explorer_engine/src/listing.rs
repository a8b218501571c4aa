use std::sync::Arc;

use explorer_core::Entry;
use explorer_logging::explorer_debug;

use crate::cache::{CacheKind, TieredCache};
use crate::drive::DriveApi;
use crate::{ExplorerError, FailureKind};

/// Metadata and full child listings, read through the durable cache tier.
pub struct ListingClient {
    api: Arc<dyn DriveApi>,
    cache: Arc<TieredCache>,
}

impl ListingClient {
    pub fn new(api: Arc<dyn DriveApi>, cache: Arc<TieredCache>) -> Self {
        Self { api, cache }
    }

    pub async fn get_metadata(&self, id: &str) -> Result<Entry, ExplorerError> {
        if let Some(entry) = self.cache.get::<Entry>(CacheKind::Metadata, id) {
            return Ok(entry);
        }
        let epoch = self.cache.epoch();
        let entry = self.api.metadata(id).await?;
        self.cache.set_in_epoch(epoch, CacheKind::Metadata, id, &entry);
        Ok(entry)
    }

    /// Follows continuation tokens to the end. Any failed page fails the
    /// whole call and nothing is cached.
    pub async fn get_children(&self, id: &str) -> Result<Vec<Entry>, ExplorerError> {
        if let Some(entries) = self.cache.get::<Vec<Entry>>(CacheKind::Children, id) {
            return Ok(entries);
        }

        let epoch = self.cache.epoch();
        let mut entries = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self.api.list_page(id, token.as_deref()).await?;
            pages += 1;
            entries.extend(page.files);
            match page.next_page_token.filter(|next| !next.is_empty()) {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(ExplorerError::new(
                        FailureKind::Malformed,
                        format!("listing of {id} repeated continuation token"),
                    ));
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }
        explorer_debug!("listed {} children of {} in {} page(s)", entries.len(), id, pages);

        self.cache.set_in_epoch(epoch, CacheKind::Children, id, &entries);
        Ok(entries)
    }

    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }
}
