use crate::DEFAULT_PAGE_SIZE;
use async_trait::async_trait;
use bookmarker_core::error::{Result, StorageError};
use bookmarker_core::store::{paginate, BookmarkStore, BookmarkStream, Page, ReadStore};
use bookmarker_core::{Bookmark, BookmarkId};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Schema for the `bookmarks` table.
pub const SCHEMA: &str = include_str!("../ddl/mysql/bookmarks.sql");

/// MySQL implementation of the store contract.
///
/// Rows live in a single `bookmarks` table keyed by `id`. The `id` column
/// uses a binary collation so that keys differing only in case stay distinct.
/// Writes are plain upserts; deletes remove the row.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    page_size: usize,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Sets the number of rows fetched per scan page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Creates the `bookmarks` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("bookmarks schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_bookmark(row: &MySqlRow) -> Result<Bookmark> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;

    Ok(Bookmark {
        id: BookmarkId::new_unchecked(id),
        url: row.try_get("url").map_err(map_sqlx_error)?,
        title: row.try_get("title").map_err(map_sqlx_error)?,
        description: row.try_get("description").map_err(map_sqlx_error)?,
        image_url: row.try_get("image_url").map_err(map_sqlx_error)?,
        kind: row.try_get("type").map_err(map_sqlx_error)?,
    })
}

fn next_cursor(items: &[Bookmark], page_size: usize) -> Option<String> {
    if items.len() < page_size {
        return None;
    }
    items.last().map(|bookmark| bookmark.id.to_string())
}

#[async_trait]
impl ReadStore for MySqlStore {
    async fn get(&self, id: &BookmarkId) -> Result<Option<Bookmark>> {
        trace!(id = %id, "reading bookmark from mysql");

        let row = sqlx::query(
            r#"
            SELECT id, url, title, description, image_url, `type`
            FROM bookmarks
            WHERE id = ?
            LIMIT 1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_bookmark).transpose()
    }

    async fn batch_get(&self, ids: &[BookmarkId]) -> Result<HashMap<BookmarkId, Bookmark>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT id, url, title, description, image_url, `type` FROM bookmarks WHERE id IN (",
        );
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| row_to_bookmark(row).map(|bookmark| (bookmark.id.clone(), bookmark)))
            .collect()
    }

    fn scan_all(&self) -> BookmarkStream<'_> {
        let pool = &self.pool;
        let page_size = self.page_size;

        paginate(move |after: Option<String>| async move {
            trace!(after = ?after, page_size, "scanning bookmarks page from mysql");

            let rows = match after {
                None => {
                    sqlx::query(
                        r#"
                        SELECT id, url, title, description, image_url, `type`
                        FROM bookmarks
                        ORDER BY id
                        LIMIT ?
                        "#,
                    )
                    .bind(page_size as u64)
                    .fetch_all(pool)
                    .await
                }
                Some(after) => {
                    sqlx::query(
                        r#"
                        SELECT id, url, title, description, image_url, `type`
                        FROM bookmarks
                        WHERE id > ?
                        ORDER BY id
                        LIMIT ?
                        "#,
                    )
                    .bind(after)
                    .bind(page_size as u64)
                    .fetch_all(pool)
                    .await
                }
            }
            .map_err(map_sqlx_error)?;

            let items = rows.iter().map(row_to_bookmark).collect::<Result<Vec<_>>>()?;
            let next = next_cursor(&items, page_size);
            Ok::<_, StorageError>(Page { items, next })
        })
    }
}

#[async_trait]
impl BookmarkStore for MySqlStore {
    async fn put(&self, bookmark: Bookmark) -> Result<()> {
        trace!(id = %bookmark.id, "writing bookmark to mysql");

        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, url, title, description, image_url, `type`)
            VALUES (?, ?, ?, ?, ?, ?) AS incoming
            ON DUPLICATE KEY UPDATE
              url = incoming.url,
              title = incoming.title,
              description = incoming.description,
              image_url = incoming.image_url,
              `type` = incoming.`type`
            "#,
        )
        .bind(bookmark.id.as_str())
        .bind(&bookmark.url)
        .bind(&bookmark.title)
        .bind(&bookmark.description)
        .bind(&bookmark.image_url)
        .bind(&bookmark.kind)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, id: &BookmarkId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM bookmarks
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
