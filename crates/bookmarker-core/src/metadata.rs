use crate::bookmark::{Bookmark, BookmarkId};
use crate::error::FetchError;
use async_trait::async_trait;
use url::Url;

/// Metadata describing a web page, as published by the page itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub kind: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.kind.is_none()
    }

    /// Builds the full replacement record for `id`.
    ///
    /// Every metadata field is taken from `self`; nothing is merged with a
    /// previously stored record.
    pub fn into_bookmark(self, id: BookmarkId, url: impl Into<String>) -> Bookmark {
        Bookmark {
            id,
            url: url.into(),
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            kind: self.kind,
        }
    }
}

/// Fetches and parses metadata for an absolute URL.
#[async_trait]
pub trait MetadataFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &Url) -> Result<PageMetadata, FetchError>;
}
