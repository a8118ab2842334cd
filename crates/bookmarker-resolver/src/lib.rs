//! Get-or-create resolution of URLs to bookmark ids.
//!
//! The resolver derives a ladder of candidate keys from the URL, reads all of
//! them in one batch and either returns the key already holding the URL or
//! claims the first free one.

pub mod service;

pub use service::ResolverService;
