mod cli;

use crate::cli::{LogFormatArg, StorageBackendArg, CLI};
use anyhow::Context;
use bookmarker_core::BookmarkStore;
use bookmarker_enricher::{
    ChangeStreamConsumer, ConsumerSettings, FetcherSettings, MetadataEnricher, OpenGraphFetcher,
};
use bookmarker_gateway::{App, AppState};
use bookmarker_resolver::ResolverService;
use bookmarker_storage::{ChangeFeedStore, InMemoryStore, MySqlStore, RedisStore};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        "starting bookmarker gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => run_server(&config, InMemoryStore::new()).await,
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlStore::connect(mysql_dsn).await?;
            store.ensure_schema().await?;
            run_server(&config, store).await
        }
        StorageBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when storage backend is redis")?;
            let store = RedisStore::connect(redis_url).await?;
            run_server(&config, store).await
        }
    }
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

async fn run_server<S: BookmarkStore>(config: &CLI, backend: S) -> anyhow::Result<()> {
    let (store, feed) = ChangeFeedStore::new(backend, config.feed_capacity);
    let store = Arc::new(store);

    let fetcher = OpenGraphFetcher::new(
        FetcherSettings::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build(),
    )?;
    let settings = ConsumerSettings {
        batch_size: config.feed_batch_size,
        max_concurrency: config.enrich_concurrency,
    };
    let consumer = ChangeStreamConsumer::new(
        MetadataEnricher::new(Arc::clone(&store), Arc::new(fetcher)),
        settings,
    );
    let consumer = tokio::spawn(async move { consumer.run(feed).await });

    let resolver = ResolverService::new(Arc::clone(&store));
    let state = AppState::new(store, Arc::new(resolver));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The enricher keeps a handle on the store, so the feed never closes on its own.
    consumer.abort();
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server simply runs until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
