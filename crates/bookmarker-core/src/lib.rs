//! Core types and traits for the bookmarker service.
//!
//! This crate provides the bookmark model, key derivation, the store
//! contract and change-event types shared by the resolver, the enricher
//! and the HTTP gateway.

pub mod bookmark;
pub mod error;
pub mod event;
pub mod key;
pub mod metadata;
pub mod resolver;
pub mod store;

pub use bookmark::{Bookmark, BookmarkId};
pub use error::{CoreError, EventError, FetchError, ResolveError, StorageError};
pub use event::{ChangeEvent, ChangeKind, Image};
pub use key::KeyDeriver;
pub use metadata::{MetadataFetcher, PageMetadata};
pub use resolver::Resolver;
pub use store::{BookmarkStore, BookmarkStream, Page, ReadStore};
