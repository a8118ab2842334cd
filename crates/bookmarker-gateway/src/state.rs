use std::sync::Arc;

use bookmarker_core::{BookmarkStore, Resolver};

/// Shared handles every request handler works with.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn BookmarkStore>,
    resolver: Arc<dyn Resolver>,
}

impl AppState {
    pub fn new(store: Arc<dyn BookmarkStore>, resolver: Arc<dyn Resolver>) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &dyn BookmarkStore {
        self.store.as_ref()
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }
}
