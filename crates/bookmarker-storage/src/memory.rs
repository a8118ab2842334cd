use crate::DEFAULT_PAGE_SIZE;
use async_trait::async_trait;
use bookmarker_core::error::Result;
use bookmarker_core::store::{paginate, BookmarkStore, BookmarkStream, Page, ReadStore};
use bookmarker_core::{Bookmark, BookmarkId};
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::trace;

/// In-memory implementation of the store contract using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking.
#[derive(Debug)]
pub struct InMemoryStore {
    storage: DashMap<BookmarkId, Bookmark>,
    page_size: usize,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Creates a new in-memory store whose scans yield pages of `page_size` rows.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            storage: DashMap::new(),
            page_size: page_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns the page of `ids` starting at `offset`, skipping rows deleted since
    /// the ids were collected.
    fn page_at(&self, ids: &[BookmarkId], offset: usize) -> Page<usize> {
        let end = (offset + self.page_size).min(ids.len());
        let items = ids[offset..end]
            .iter()
            .filter_map(|id| self.storage.get(id).map(|entry| entry.value().clone()))
            .collect();
        let next = (end < ids.len()).then_some(end);

        Page { items, next }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadStore for InMemoryStore {
    async fn get(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        trace!(id = %id, "reading bookmark from memory");
        Ok(self.storage.get(id).map(|entry| entry.value().clone()))
    }

    async fn batch_get(&self, ids: &[BookmarkId]) -> Result<HashMap<BookmarkId, Bookmark>> {
        let found = ids
            .iter()
            .filter_map(|id| {
                self.storage
                    .get(id)
                    .map(|entry| (id.clone(), entry.value().clone()))
            })
            .collect();
        Ok(found)
    }

    /// Ids are collected and sorted once when the scan starts; rows written
    /// after that are not part of the scan.
    fn scan_all(&self) -> BookmarkStream<'_> {
        let mut ids: Vec<BookmarkId> = self
            .storage
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort_unstable();

        paginate(move |offset: Option<usize>| {
            let page = self.page_at(&ids, offset.unwrap_or(0));
            async move { Ok(page) }
        })
    }
}

#[async_trait]
impl BookmarkStore for InMemoryStore {
    async fn put(&self, bookmark: Bookmark) -> Result<()> {
        trace!(id = %bookmark.id, "writing bookmark to memory");
        self.storage.insert(bookmark.id.clone(), bookmark);
        Ok(())
    }

    async fn delete(&self, id: &BookmarkId) -> Result<bool> {
        Ok(self.storage.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmarker_core::store::collect_all;
    use futures::TryStreamExt;
    use std::sync::Arc;

    fn id(s: &str) -> BookmarkId {
        BookmarkId::new_unchecked(s)
    }

    fn bookmark(key: &str, url: &str) -> Bookmark {
        Bookmark::new(id(key), url)
    }

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryStore::new();

        store
            .put(bookmark("abc", "https://example.com"))
            .await
            .unwrap();

        let result = store.get(&id("abc")).await.unwrap().unwrap();
        assert_eq!(result.url, "https://example.com");
        assert_eq!(result.title, None);
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let store = InMemoryStore::new();

        let result = store.get(&id("nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_record() {
        let store = InMemoryStore::new();

        store
            .put(Bookmark {
                title: Some("Old".to_string()),
                description: Some("stale".to_string()),
                ..bookmark("abc", "https://example.com")
            })
            .await
            .unwrap();
        store
            .put(Bookmark {
                title: Some("New".to_string()),
                ..bookmark("abc", "https://example.com")
            })
            .await
            .unwrap();

        let result = store.get(&id("abc")).await.unwrap().unwrap();
        assert_eq!(result.title.as_deref(), Some("New"));
        assert_eq!(result.description, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn batch_get_returns_only_existing_ids() {
        let store = InMemoryStore::new();
        store.put(bookmark("aaa", "https://a.example")).await.unwrap();
        store.put(bookmark("ccc", "https://c.example")).await.unwrap();

        let found = store
            .batch_get(&[id("aaa"), id("bbb"), id("ccc")])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[&id("aaa")].url, "https://a.example");
        assert_eq!(found[&id("ccc")].url, "https://c.example");
        assert!(!found.contains_key(&id("bbb")));
    }

    #[tokio::test]
    async fn batch_get_with_no_ids() {
        let store = InMemoryStore::new();
        assert!(store.batch_get(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_existing() {
        let store = InMemoryStore::new();
        store
            .put(bookmark("abc", "https://example.com"))
            .await
            .unwrap();

        assert!(store.delete(&id("abc")).await.unwrap());
        assert!(store.get(&id("abc")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_nonexistent() {
        let store = InMemoryStore::new();

        assert!(!store.delete(&id("nope")).await.unwrap());
    }

    #[tokio::test]
    async fn scan_all_pages_through_every_record() {
        let store = InMemoryStore::with_page_size(2);
        for i in 0..5 {
            store
                .put(bookmark(&format!("id{i}"), &format!("https://example{i}.com")))
                .await
                .unwrap();
        }

        let all = collect_all(&store).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["id0", "id1", "id2", "id3", "id4"]);
    }

    #[tokio::test]
    async fn scan_skips_rows_deleted_while_it_runs() {
        let store = InMemoryStore::with_page_size(2);
        for key in ["ddd", "bbb", "aaa", "ccc"] {
            store
                .put(bookmark(key, &format!("https://{key}.example")))
                .await
                .unwrap();
        }

        let mut stream = store.scan_all();
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.id.as_str(), "aaa");

        store.delete(&id("ddd")).await.unwrap();
        store.put(bookmark("eee", "https://eee.example")).await.unwrap();

        let rest: Vec<Bookmark> = stream.try_collect().await.unwrap();
        let ids: Vec<&str> = rest.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["bbb", "ccc"]);
    }

    #[tokio::test]
    async fn scan_all_on_empty_store() {
        let store = InMemoryStore::new();
        assert!(collect_all(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_access() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let b = bookmark(&format!("id-{:03}", i), &format!("https://example{}.com", i));
                store.put(b).await.unwrap();
            }));
        }

        for i in 0..10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let _ = store.get(&id(&format!("id-{:03}", i))).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10u64 {
            let result = store
                .get(&id(&format!("id-{:03}", i)))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(result.url, format!("https://example{}.com", i));
        }
    }
}
