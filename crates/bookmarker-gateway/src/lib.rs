//! HTTP API over the bookmark store.
//!
//! The router is a thin layer: creation goes through the resolver, every
//! other route reads or deletes records directly.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod preview;
pub mod state;

pub use app::App;
pub use state::AppState;
