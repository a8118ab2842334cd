use crate::bookmark::{Bookmark, BookmarkId};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::future::Future;

/// A lazy, finite stream over every stored bookmark.
pub type BookmarkStream<'a> = BoxStream<'a, Result<Bookmark>>;

/// A read-only view of a bookmark store.
///
/// Read paths (lookup, listing, preview, redirect) only need this half of
/// the contract.
#[async_trait]
pub trait ReadStore: Send + Sync + 'static {
    /// Retrieves the bookmark stored under `id`.
    /// Returns `None` if the id does not exist.
    async fn get(&self, id: &BookmarkId) -> Result<Option<Bookmark>>;

    /// Retrieves every bookmark whose id is in `ids` in a single round-trip.
    ///
    /// Ids that do not exist are simply absent from the returned map.
    async fn batch_get(&self, ids: &[BookmarkId]) -> Result<HashMap<BookmarkId, Bookmark>>;

    /// Streams every stored bookmark, fetching pages from the backend lazily.
    ///
    /// A scan can only be restarted from the beginning.
    fn scan_all(&self) -> BookmarkStream<'_>;
}

#[async_trait]
pub trait BookmarkStore: ReadStore {
    /// Stores `bookmark` under its id, overwriting any existing record.
    async fn put(&self, bookmark: Bookmark) -> Result<()>;

    /// Deletes the bookmark stored under `id`.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, id: &BookmarkId) -> Result<bool>;
}

/// One page of a paginated scan.
#[derive(Debug)]
pub struct Page<C> {
    pub items: Vec<Bookmark>,
    /// Cursor for the following page, `None` once the scan is complete.
    pub next: Option<C>,
}

enum Cursor<C> {
    Start,
    At(C),
    Done,
}

/// Builds a [`BookmarkStream`] from a page-fetching function.
///
/// `fetch` receives `None` for the first page and the cursor returned by the
/// previous page afterwards. Pages are only requested as the stream is polled.
pub fn paginate<'a, C, F, Fut>(mut fetch: F) -> BookmarkStream<'a>
where
    C: Send + 'a,
    F: FnMut(Option<C>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page<C>>> + Send + 'a,
{
    stream::try_unfold(Cursor::Start, move |cursor| {
        let pending = match cursor {
            Cursor::Start => Some(fetch(None)),
            Cursor::At(c) => Some(fetch(Some(c))),
            Cursor::Done => None,
        };

        async move {
            let Some(pending) = pending else {
                return Ok::<_, StorageError>(None);
            };

            let page = pending.await?;
            let cursor = match page.next {
                Some(c) => Cursor::At(c),
                None => Cursor::Done,
            };
            let items = stream::iter(page.items.into_iter().map(Ok::<Bookmark, StorageError>));
            Ok(Some((items, cursor)))
        }
    })
    .try_flatten()
    .boxed()
}

/// Drains a scan into memory.
pub async fn collect_all(store: &dyn ReadStore) -> Result<Vec<Bookmark>> {
    store.scan_all().try_collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bookmark(id: &str) -> Bookmark {
        Bookmark::new(
            BookmarkId::new_unchecked(id),
            format!("https://example.com/{id}"),
        )
    }

    #[tokio::test]
    async fn paginate_walks_every_page_in_order() {
        let pages = vec![
            vec![bookmark("aaa"), bookmark("bbb")],
            vec![],
            vec![bookmark("ccc")],
        ];

        let stream = paginate(move |cursor: Option<usize>| {
            let index = cursor.unwrap_or(0);
            let items = pages[index].clone();
            let next = (index + 1 < pages.len()).then_some(index + 1);
            async move { Ok(Page { items, next }) }
        });

        let ids: Vec<String> = stream
            .map_ok(|b| b.id.to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
    }

    #[tokio::test]
    async fn paginate_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));

        let mut stream = paginate({
            let calls = Arc::clone(&calls);
            move |cursor: Option<u32>| {
                calls.fetch_add(1, Ordering::SeqCst);
                let page = cursor.unwrap_or(0);
                async move {
                    Ok(Page {
                        items: vec![bookmark(&format!("p{page:02}"))],
                        next: Some(page + 1),
                    })
                }
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.id.as_str(), "p00");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn paginate_stops_after_error() {
        let mut stream = paginate(|cursor: Option<u8>| async move {
            match cursor {
                None => Ok(Page {
                    items: vec![bookmark("aaa")],
                    next: Some(1),
                }),
                Some(_) => Err(StorageError::Unavailable("connection reset".to_string())),
            }
        });

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
