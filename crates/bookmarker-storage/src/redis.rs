use crate::DEFAULT_PAGE_SIZE;
use ::redis::aio::MultiplexedConnection;
use ::redis::RedisError;
use async_trait::async_trait;
use bookmarker_core::error::{Result, StorageError};
use bookmarker_core::store::{paginate, BookmarkStore, BookmarkStream, Page, ReadStore};
use bookmarker_core::{Bookmark, BookmarkId};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

pub const DEFAULT_KEY_PREFIX: &str = "bm:bookmark:";

/// A Redis-based implementation of the store contract.
///
/// Each bookmark is stored as a JSON string under `{prefix}{id}`. Scans walk
/// the keyspace with `SCAN MATCH {prefix}*`, so a row may be yielded twice
/// if the keyspace is rehashed while a scan is in progress.
#[derive(Debug, Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    key_prefix: String,
    page_size: usize,
}

fn map_redis_error(operation: &str, err: RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

fn decode(key: &str, raw: &str) -> Result<Bookmark> {
    serde_json::from_str(raw).map_err(|e| {
        warn!(key = %key, error = %e, "failed to deserialize stored bookmark");
        StorageError::InvalidData(format!("invalid value for key '{key}': {e}"))
    })
}

impl RedisStore {
    /// Creates a new Redis store.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis store with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `conn` - A multiplexed Redis connection
    /// * `key_prefix` - Custom prefix for keys (e.g., "myapp:bookmark:")
    pub fn with_prefix(conn: MultiplexedConnection, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Opens a connection to `redis_url` and creates a store over it.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = ::redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("failed to create Redis client", e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::new(conn))
    }

    /// Sets the `COUNT` hint used for each scan page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn key(&self, id: &BookmarkId) -> String {
        format!("{}{}", self.key_prefix, id.as_str())
    }

    /// Fetches the values stored under `keys` with a single `MGET`.
    async fn fetch_many(
        conn: &mut MultiplexedConnection,
        keys: &[String],
    ) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        ::redis::cmd("MGET")
            .arg(keys)
            .query_async(conn)
            .await
            .map_err(|e| map_redis_error("failed to fetch values from Redis", e))
    }
}

#[async_trait]
impl ReadStore for RedisStore {
    async fn get(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        let key = self.key(id);
        trace!(id = %id, "reading bookmark from Redis");

        let mut conn = self.conn.clone();
        let raw: Option<String> = ::redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to fetch value from Redis", e))?;

        raw.map(|raw| decode(&key, &raw)).transpose()
    }

    async fn batch_get(&self, ids: &[BookmarkId]) -> Result<HashMap<BookmarkId, Bookmark>> {
        let keys: Vec<String> = ids.iter().map(|id| self.key(id)).collect();

        let mut conn = self.conn.clone();
        let values = Self::fetch_many(&mut conn, &keys).await?;

        let mut found = HashMap::new();
        for ((id, key), raw) in ids.iter().zip(&keys).zip(values) {
            if let Some(raw) = raw {
                found.insert(id.clone(), decode(key, &raw)?);
            }
        }

        debug!(requested = ids.len(), found = found.len(), "batch read from Redis");
        Ok(found)
    }

    fn scan_all(&self) -> BookmarkStream<'_> {
        let pattern = format!("{}*", self.key_prefix);
        let page_size = self.page_size;

        paginate(move |cursor: Option<u64>| {
            let mut conn = self.conn.clone();
            let pattern = pattern.clone();

            async move {
                let (next, keys): (u64, Vec<String>) = ::redis::cmd("SCAN")
                    .arg(cursor.unwrap_or(0))
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(page_size)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| map_redis_error("failed to scan Redis keyspace", e))?;

                let values = Self::fetch_many(&mut conn, &keys).await?;
                let mut items = Vec::with_capacity(values.len());
                for (key, raw) in keys.iter().zip(values) {
                    // The key may have been deleted between SCAN and MGET.
                    if let Some(raw) = raw {
                        items.push(decode(key, &raw)?);
                    }
                }

                let next = (next != 0).then_some(next);
                Ok::<_, StorageError>(Page { items, next })
            }
        })
    }
}

#[async_trait]
impl BookmarkStore for RedisStore {
    async fn put(&self, bookmark: Bookmark) -> Result<()> {
        let key = self.key(&bookmark.id);
        trace!(id = %bookmark.id, "writing bookmark to Redis");

        let json = serde_json::to_string(&bookmark).map_err(|e| {
            StorageError::InvalidData(format!("failed to serialize bookmark: {e}"))
        })?;

        let mut conn = self.conn.clone();
        ::redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to write value to Redis", e))
    }

    async fn delete(&self, id: &BookmarkId) -> Result<bool> {
        let key = self.key(id);

        let mut conn = self.conn.clone();
        let removed: u64 = ::redis::cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("failed to delete value from Redis", e))?;

        Ok(removed > 0)
    }
}
