use crate::enricher::MetadataEnricher;
use crate::error::EnrichError;
use bookmarker_core::{Bookmark, BookmarkStore, ChangeEvent, MetadataFetcher};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct ConsumerSettings {
    /// Maximum number of events pulled from the feed per batch.
    #[builder(default = 25)]
    pub batch_size: usize,
    /// Upper bound on enrichment tasks running at once; unbounded if unset.
    #[builder(default, setter(strip_option))]
    pub max_concurrency: Option<usize>,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Tally of a processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub received: usize,
    pub inserts: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Turns batches of change events into enrichment tasks.
///
/// Only `Insert` events are acted upon. Every insert gets its own task, the
/// tasks run concurrently, and the batch completes once all of them have
/// finished. A failing or panicking task never affects its siblings and never
/// fails the batch.
pub struct ChangeStreamConsumer<S: ?Sized, F: ?Sized> {
    enricher: MetadataEnricher<S, F>,
    settings: ConsumerSettings,
    limiter: Option<Arc<Semaphore>>,
}

impl<S, F> ChangeStreamConsumer<S, F>
where
    S: BookmarkStore + ?Sized,
    F: MetadataFetcher + ?Sized,
{
    pub fn new(enricher: MetadataEnricher<S, F>, settings: ConsumerSettings) -> Self {
        let limiter = settings
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits.max(1))));

        Self {
            enricher,
            settings,
            limiter,
        }
    }

    /// Processes one batch of change events and waits for every task it started.
    pub async fn handle_batch(&self, events: Vec<ChangeEvent>) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            received: events.len(),
            ..BatchOutcome::default()
        };
        info!(count = outcome.received, "received change events");

        let mut tasks = JoinSet::new();
        for event in events.into_iter().filter(ChangeEvent::is_insert) {
            outcome.inserts += 1;
            debug!(event_id = %event.event_id, "scheduling enrichment");

            let enricher = self.enricher.clone();
            let limiter = self.limiter.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let result = enrich_event(&enricher, &event).await;
                (event.event_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => outcome.enriched += 1,
                Ok((event_id, Err(e))) => {
                    outcome.failed += 1;
                    warn!(event_id = %event_id, error = %e, "change event not enriched");
                }
                Err(e) => {
                    outcome.failed += 1;
                    error!(error = %e, "enrichment task aborted");
                }
            }
        }

        info!(
            received = outcome.received,
            inserts = outcome.inserts,
            enriched = outcome.enriched,
            failed = outcome.failed,
            "change batch processed"
        );
        outcome
    }

    /// Drains `receiver` batch by batch until every sender is gone.
    pub async fn run(&self, mut receiver: mpsc::Receiver<ChangeEvent>) {
        let batch_size = self.settings.batch_size.max(1);
        let mut buffer = Vec::with_capacity(batch_size);

        info!(batch_size, "change stream consumer started");
        while receiver.recv_many(&mut buffer, batch_size).await > 0 {
            self.handle_batch(std::mem::take(&mut buffer)).await;
        }
        info!("change feed closed; consumer stopped");
    }
}

async fn enrich_event<S, F>(
    enricher: &MetadataEnricher<S, F>,
    event: &ChangeEvent,
) -> Result<Bookmark, EnrichError>
where
    S: BookmarkStore + ?Sized,
    F: MetadataFetcher + ?Sized,
{
    let (id, url) = event.id_and_url()?;
    enricher.enrich(id, url).await
}
