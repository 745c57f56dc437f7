use anyhow::Context;
use skill_search::{
    api::{build_router, AppState},
    config::Config,
    messaging::{init_messaging_metrics, MessageConsumer, MessageProducer, MessagingService},
    search::{DocumentStore, IndexBootstrap, IndexView, SearchEngine, TantivyStore},
    sync::{IndexRoutes, IndexSyncConsumer, SyncProcessor},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("skill_search={},tower_http=info", config.observability.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Starting {} v{}",
        config.observability.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.prometheus_enabled && config.messaging.enable_metrics {
        init_messaging_metrics();
        tracing::info!("Prometheus metrics initialized");
    }

    // Open the index store
    let tantivy = Arc::new(
        TantivyStore::open(config.search.clone()).context("failed to open index store")?,
    );
    let store: Arc<dyn DocumentStore> = tantivy.clone();
    tracing::info!(path = %config.search.index_path.display(), "Index store opened");

    // Create missing indices before anything reads or writes them
    let bootstrap = IndexBootstrap::new(store.clone());
    for view in [IndexView::Published, IndexView::Admin] {
        bootstrap
            .ensure_view(view)
            .await
            .with_context(|| format!("failed to create {view} indices"))?;
    }
    tracing::info!("Indices ready");

    // Buffered writes become searchable on the commit interval
    let committer = tantivy.start_committer();

    let timeout = config.server.request_timeout();
    let published = Arc::new(
        SearchEngine::for_store(store.clone(), IndexView::Published, &config.search)
            .with_timeout(timeout),
    );
    let admin = Arc::new(
        SearchEngine::for_store(store.clone(), IndexView::Admin, &config.search)
            .with_timeout(timeout),
    );

    // Start sync consumers
    let messaging = Arc::new(
        MessagingService::new(config.messaging.clone())
            .await
            .context("failed to connect to the message queue")?,
    );
    tracing::info!(backend = %messaging.backend(), "Messaging service initialized");

    let mut consumers = Vec::new();
    for view in config.sync.views() {
        let processor = Arc::new(SyncProcessor::new(store.clone(), IndexRoutes::for_view(view)));
        let consumer = Arc::new(
            IndexSyncConsumer::new(
                processor,
                messaging.clone(),
                config.messaging.topic_for(view),
                config.messaging.consumer_group.clone(),
            )
            .with_retry_backoff(Duration::from_millis(config.sync.retry_backoff_ms)),
        );
        consumer
            .start()
            .await
            .with_context(|| format!("failed to start {view} sync consumer"))?;
        consumers.push(consumer);
    }

    let app_state = AppState::new(published, admin).with_consumers(consumers.clone());
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search: http://{}/v1/search?q=biz:all:<keywords>", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down gracefully...");
    for consumer in &consumers {
        consumer.stop().await;
    }
    if let Err(e) = MessageConsumer::close(messaging.as_ref()).await {
        tracing::warn!("Failed to close consumer: {}", e);
    }
    if let Err(e) = MessageProducer::close(messaging.as_ref()).await {
        tracing::warn!("Failed to close producer: {}", e);
    }
    if let Some(committer) = committer {
        committer.stop().await;
    }
    if let Err(e) = tantivy.commit_all().await {
        tracing::error!("Failed to commit indices: {}", e);
    }

    Ok(())
}
