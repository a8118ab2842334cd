use async_trait::async_trait;
use bookmarker_core::{FetchError, MetadataFetcher, PageMetadata};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Serves canned metadata per URL; unknown URLs answer with a 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, PageMetadata>>,
    panics_on: Mutex<Option<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFetcher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: &str, metadata: PageMetadata) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), metadata);
    }

    pub fn panic_on(&self, url: &str) {
        *self.panics_on.lock().unwrap() = Some(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageMetadata, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panics_on.lock().unwrap().as_deref() == Some(url.as_str()) {
            panic!("fetcher exploded on {url}");
        }

        self.pages
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}
