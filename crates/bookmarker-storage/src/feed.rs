use async_trait::async_trait;
use bookmarker_core::error::Result;
use bookmarker_core::store::{BookmarkStore, BookmarkStream, ReadStore};
use bookmarker_core::{Bookmark, BookmarkId, ChangeEvent, ChangeKind, Image};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace, warn};

/// A store decorator that publishes a [`ChangeEvent`] for every committed write.
///
/// Events are delivered on a bounded channel in commit order. A put on an
/// absent key produces `Insert`, a put on an existing key produces `Modify`,
/// and a delete that removed a row produces `Remove`.
///
/// Writes never wait on the feed. The consumer of the feed writes back through
/// this store, so any wait here could block on the task meant to drain it.
/// When the channel is full an `Insert` is handed to a detached task that
/// delivers it once room frees up, so overflowed inserts may arrive out of
/// order. `Modify` and `Remove` are dropped with a warning.
#[derive(Debug)]
pub struct ChangeFeedStore<S> {
    inner: S,
    sender: mpsc::Sender<ChangeEvent>,
    sequence: AtomicU64,
}

impl<S: BookmarkStore> ChangeFeedStore<S> {
    /// Wraps `inner` and returns the receiving end of its change feed.
    pub fn new(inner: S, capacity: usize) -> (Self, mpsc::Receiver<ChangeEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let store = Self {
            inner,
            sender,
            sequence: AtomicU64::new(0),
        };
        (store, receiver)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn publish(&self, kind: ChangeKind, new_image: Option<Image>) {
        let event_id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let event = ChangeEvent::new(event_id.to_string(), kind, new_image);
        trace!(event_id, kind = ?kind, "publishing change event");

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) if kind == ChangeKind::Insert => {
                debug!(event_id, "change feed is full; deferring insert");
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    if sender.send(event).await.is_err() {
                        warn!(event_id, "change feed receiver dropped; insert discarded");
                    }
                });
            }
            Err(TrySendError::Full(_)) => {
                warn!(event_id, kind = ?kind, "change feed is full; event dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(event_id, kind = ?kind, "change feed receiver dropped; event discarded");
            }
        }
    }
}

#[async_trait]
impl<S: BookmarkStore> ReadStore for ChangeFeedStore<S> {
    async fn get(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        self.inner.get(id).await
    }

    async fn batch_get(&self, ids: &[BookmarkId]) -> Result<HashMap<BookmarkId, Bookmark>> {
        self.inner.batch_get(ids).await
    }

    fn scan_all(&self) -> BookmarkStream<'_> {
        self.inner.scan_all()
    }
}

#[async_trait]
impl<S: BookmarkStore> BookmarkStore for ChangeFeedStore<S> {
    async fn put(&self, bookmark: Bookmark) -> Result<()> {
        let existed = self.inner.get(&bookmark.id).await?.is_some();
        let image = Image::from(&bookmark);

        self.inner.put(bookmark).await?;

        let kind = if existed {
            ChangeKind::Modify
        } else {
            ChangeKind::Insert
        };
        self.publish(kind, Some(image));
        Ok(())
    }

    async fn delete(&self, id: &BookmarkId) -> Result<bool> {
        let removed = self.inner.delete(id).await?;
        if removed {
            self.publish(ChangeKind::Remove, None);
        }
        Ok(removed)
    }
}
