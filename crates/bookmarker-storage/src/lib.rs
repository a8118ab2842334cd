//! Storage backends for bookmarks.
//!
//! Every backend implements [`BookmarkStore`]. [`ChangeFeedStore`] wraps any
//! of them and publishes a [`ChangeEvent`](bookmarker_core::ChangeEvent) for
//! every successful write.

pub mod feed;
pub mod memory;
pub mod mysql;
pub mod redis;

pub use bookmarker_core::error::{Result, StorageError};
pub use bookmarker_core::store::{BookmarkStore, ReadStore};
pub use crate::feed::ChangeFeedStore;
pub use crate::memory::InMemoryStore;
pub use crate::mysql::MySqlStore;
pub use crate::redis::RedisStore;

/// Default number of rows fetched per scan page.
pub const DEFAULT_PAGE_SIZE: usize = 100;
