use async_trait::async_trait;
use bookmarker_core::{Bookmark, BookmarkId, BookmarkStore, KeyDeriver, ResolveError, Resolver};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// A concrete implementation of the [`Resolver`] trait.
///
/// Each call reads every candidate key with a single `batch_get`, then:
/// - returns the candidate whose stored url equals the submitted string,
/// - otherwise writes a new record under the first candidate nobody holds,
/// - and fails with [`ResolveError::ResourceExhausted`] when every candidate
///   belongs to another URL.
///
/// The read and the write are not atomic, and two races follow from that:
/// - Two concurrent first submissions of the same URL both see the shortest
///   key free and both write it. The records are identical, so both callers
///   get the same key and the second write only repeats the first.
/// - Two concurrent calls for different URLs sharing a free prefix may both
///   pick it. The later `put` wins, so the earlier caller holds a key that now
///   redirects to the other URL until its URL is submitted again.
///
/// Both races are accepted. The store offers no conditional write.
#[derive(Debug)]
pub struct ResolverService<S: ?Sized> {
    store: Arc<S>,
    keys: KeyDeriver,
}

impl<S: ?Sized> Clone for ResolverService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys,
        }
    }
}

impl<S: BookmarkStore + ?Sized> ResolverService<S> {
    /// Creates a resolver over a shared store using the default key ladder.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_keys(store, KeyDeriver::default())
    }

    pub fn with_keys(store: Arc<S>, keys: KeyDeriver) -> Self {
        Self { store, keys }
    }

    /// Checks that `url` is an absolute URL. The input itself is kept as-is.
    ///
    /// `Url::parse` strips tabs and newlines and trims spaces, so those are
    /// rejected up front: the raw string is what gets stored and later sent
    /// back as a `Location` header.
    fn validate_url(url: &str) -> Result<(), ResolveError> {
        if url.trim().is_empty() {
            return Err(ResolveError::InvalidInput("URL cannot be empty".to_string()));
        }

        if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(ResolveError::InvalidInput(format!(
                "{url:?} contains whitespace or control characters"
            )));
        }

        Url::parse(url)
            .map(|_| ())
            .map_err(|e| ResolveError::InvalidInput(format!("'{url}' is not an absolute URL: {e}")))
    }
}

#[async_trait]
impl<S: BookmarkStore + ?Sized> Resolver for ResolverService<S> {
    async fn resolve(&self, url: &str) -> Result<BookmarkId, ResolveError> {
        Self::validate_url(url)?;

        let candidates = self.keys.candidates(url);
        let existing = self.store.batch_get(&candidates).await?;

        if let Some(id) = candidates
            .iter()
            .find(|id| existing.get(*id).is_some_and(|bookmark| bookmark.url == url))
        {
            debug!(id = %id, "url already bookmarked");
            return Ok(id.clone());
        }

        let Some(free) = candidates.iter().find(|id| !existing.contains_key(*id)) else {
            warn!(url = %url, candidates = candidates.len(), "every candidate key is taken");
            return Err(ResolveError::ResourceExhausted(url.to_string()));
        };

        self.store.put(Bookmark::new(free.clone(), url)).await?;
        info!(id = %free, "created bookmark");
        Ok(free.clone())
    }
}
