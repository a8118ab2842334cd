use bookmarker_core::{BookmarkId, EventError, FetchError, StorageError};
use thiserror::Error;

/// Failure of a single enrichment task.
///
/// These never leave the task that produced them; the consumer logs and
/// counts them.
#[derive(Debug, Clone, Error)]
pub enum EnrichError {
    #[error("malformed change event: {0}")]
    MalformedEvent(#[from] EventError),
    #[error("failed to fetch metadata: {0}")]
    Fetch(#[from] FetchError),
    #[error("bookmark {0} was removed before it could be enriched")]
    Removed(BookmarkId),
    #[error("failed to store enriched bookmark: {0}")]
    Storage(#[from] StorageError),
}
