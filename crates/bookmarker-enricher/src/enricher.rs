use crate::error::EnrichError;
use bookmarker_core::event::ATTR_URL;
use bookmarker_core::{Bookmark, BookmarkId, BookmarkStore, EventError, MetadataFetcher};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Fills in page metadata for a stored bookmark.
///
/// A successful fetch replaces the whole record: fields the page no longer
/// publishes are cleared rather than kept from an earlier run. A failed fetch
/// leaves the stored record untouched, and a record deleted while its page
/// was being fetched is not written back.
pub struct MetadataEnricher<S: ?Sized, F: ?Sized> {
    store: Arc<S>,
    fetcher: Arc<F>,
}

impl<S: ?Sized, F: ?Sized> Clone for MetadataEnricher<S, F> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<S, F> MetadataEnricher<S, F>
where
    S: BookmarkStore + ?Sized,
    F: MetadataFetcher + ?Sized,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>) -> Self {
        Self { store, fetcher }
    }

    /// Fetches metadata for `url` and stores the enriched record under `id`.
    ///
    /// Returns the record that was written.
    pub async fn enrich(&self, id: BookmarkId, url: String) -> Result<Bookmark, EnrichError> {
        let result = self.fetch_and_store(id.clone(), &url).await;

        match &result {
            Ok(bookmark) => info!(
                id = %id,
                url = %url,
                title = bookmark.title.as_deref().unwrap_or_default(),
                kind = bookmark.kind.as_deref().unwrap_or_default(),
                "bookmark enriched"
            ),
            Err(e) => warn!(id = %id, url = %url, error = %e, "bookmark enrichment failed"),
        }

        result
    }

    async fn fetch_and_store(&self, id: BookmarkId, url: &str) -> Result<Bookmark, EnrichError> {
        let parsed = Url::parse(url).map_err(|e| EventError::InvalidAttribute {
            name: ATTR_URL,
            reason: e.to_string(),
        })?;

        let metadata = self.fetcher.fetch(&parsed).await?;

        // A delete racing between this read and the put below can still lose.
        if self.store.get(&id).await?.is_none() {
            return Err(EnrichError::Removed(id));
        }
        let bookmark = metadata.into_bookmark(id, url);
        self.store.put(bookmark.clone()).await?;

        Ok(bookmark)
    }
}
