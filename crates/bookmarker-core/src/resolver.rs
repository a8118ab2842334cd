use crate::bookmark::BookmarkId;
use crate::error::ResolveError;
use async_trait::async_trait;

#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Returns the id of the bookmark for `url`, creating it if needed.
    ///
    /// Resubmitting the same URL returns the same id without writing.
    async fn resolve(&self, url: &str) -> Result<BookmarkId, ResolveError>;
}
