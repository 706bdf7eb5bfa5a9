use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summit_news::aggregator::Aggregator;
use summit_news::cache::{start_background_refresh, FeedCache};
use summit_news::calendar::{Clock, SystemClock};
use summit_news::classifier::Classifier;
use summit_news::config::Config;
use summit_news::db::Database;
use summit_news::fetcher::Fetcher;
use summit_news::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summit_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("SUMMIT_CONFIG").unwrap_or_else(|_| "summit.toml".to_string());
    let config = Config::load(&config_path)?;
    let registry = config.registry();
    info!("Loaded {} sources from configuration", registry.len());

    // Initialize manual story store
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:summit_news.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let calendar = Arc::new(config.conference.clone());
    let classifier = Arc::new(Classifier::new(&config.keywords));

    let fetcher = Fetcher::new(&config.fetch, classifier, calendar.clone(), clock.clone())?;
    let aggregator = Arc::new(Aggregator::new(fetcher, config.fetch.max_items));
    let cache = Arc::new(FeedCache::new(aggregator, registry, clock.clone()));

    // Start background refresh task
    let bg_cache = cache.clone();
    let refresh_interval = config.refresh_interval;
    tokio::spawn(async move {
        start_background_refresh(bg_cache, refresh_interval).await;
    });

    let state = Arc::new(AppState {
        cache,
        store: Arc::new(db),
        calendar,
        clock,
    });

    let app = routes::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
