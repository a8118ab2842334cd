//! Asynchronous metadata enrichment for newly created bookmarks.
//!
//! [`ChangeStreamConsumer`] reads batches of change events, starts one
//! [`MetadataEnricher`] task per inserted row and waits for all of them.
//! [`OpenGraphFetcher`] is the HTTP implementation of the core
//! [`MetadataFetcher`](bookmarker_core::MetadataFetcher) trait.

pub mod consumer;
pub mod enricher;
pub mod error;
pub mod opengraph;

#[cfg(test)]
mod testing;

pub use consumer::{BatchOutcome, ChangeStreamConsumer, ConsumerSettings};
pub use enricher::MetadataEnricher;
pub use error::EnrichError;
pub use opengraph::{FetcherSettings, OpenGraphFetcher};
