use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::calendar::Clock;
use crate::error::PipelineError;
use crate::model::NewsItem;
use crate::sources::SourceRegistry;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Arc<Vec<NewsItem>>,
    pub refreshed_at: DateTime<Utc>,
}

/// Holds the latest aggregation so requests don't each hit every feed.
pub struct FeedCache {
    aggregator: Arc<Aggregator>,
    registry: SourceRegistry,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Option<Snapshot>>,
    refreshing: RwLock<bool>,
    /// Held for the duration of an aggregation so only one runs at a time.
    running: Mutex<()>,
}

impl FeedCache {
    pub fn new(aggregator: Arc<Aggregator>, registry: SourceRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregator,
            registry,
            clock,
            snapshot: RwLock::new(None),
            refreshing: RwLock::new(false),
            running: Mutex::new(()),
        }
    }

    pub async fn is_refreshing(&self) -> bool {
        *self.refreshing.read().await
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Latest aggregated items. A cold cache waits for the aggregation in
    /// flight, or runs one itself if none left a snapshot behind.
    pub async fn items(&self) -> Result<Arc<Vec<NewsItem>>, PipelineError> {
        if let Some(snapshot) = self.snapshot().await {
            return Ok(snapshot.items);
        }

        let _running = self.running.lock().await;
        if let Some(snapshot) = self.snapshot().await {
            return Ok(snapshot.items);
        }
        Ok(self.run().await?.items)
    }

    /// Returns `Ok(false)` when another refresh was already running.
    pub async fn refresh(&self) -> Result<bool, PipelineError> {
        {
            let mut refreshing = self.refreshing.write().await;
            if *refreshing {
                info!("Refresh already in progress, skipping");
                return Ok(false);
            }
            *refreshing = true;
        }

        let result = {
            let _running = self.running.lock().await;
            self.run().await
        };

        {
            let mut refreshing = self.refreshing.write().await;
            *refreshing = false;
        }

        result.map(|_| true)
    }

    async fn run(&self) -> Result<Snapshot, PipelineError> {
        let aggregator = self.aggregator.clone();
        let registry = self.registry.clone();

        // A panic inside the batch surfaces here as a JoinError
        let items = tokio::spawn(async move { aggregator.aggregate(registry.sources()).await }).await?;

        let snapshot = Snapshot {
            items: Arc::new(items),
            refreshed_at: self.clock.now(),
        };
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}

pub async fn start_background_refresh(cache: Arc<FeedCache>, interval_minutes: u64) {
    let interval = Duration::from_secs(interval_minutes.max(1).saturating_mul(60));

    info!("Starting initial feed aggregation");
    if let Err(e) = cache.refresh().await {
        error!("Initial aggregation failed: {}", e);
    }

    loop {
        tokio::time::sleep(interval).await;
        info!("Starting scheduled feed aggregation");
        if let Err(e) = cache.refresh().await {
            error!("Scheduled aggregation failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ConferenceCalendar, FixedClock};
    use crate::classifier::Classifier;
    use crate::config::FetchConfig;
    use crate::fetcher::Fetcher;
    use crate::sources::{Region, Source};
    use chrono::TimeZone;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 16, 10, 0, 0).unwrap()
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn now(&self) -> DateTime<Utc> {
            panic!("clock unavailable")
        }
    }

    fn create_test_cache(sources: Vec<Source>) -> FeedCache {
        create_test_cache_with_fetch_clock(sources, Arc::new(FixedClock(now())))
    }

    fn create_test_cache_with_fetch_clock(
        sources: Vec<Source>,
        fetch_clock: Arc<dyn Clock>,
    ) -> FeedCache {
        let fetcher = Fetcher::new(
            &FetchConfig::default(),
            Arc::new(Classifier::default()),
            Arc::new(ConferenceCalendar::default()),
            fetch_clock,
        )
        .unwrap();
        FeedCache::new(
            Arc::new(Aggregator::new(fetcher, 150)),
            SourceRegistry::new(sources),
            Arc::new(FixedClock(now())),
        )
    }

    fn mock_source(server: &MockServer) -> Source {
        Source::new(
            "mock",
            "Mock",
            &format!("{}/rss", server.uri()),
            Region::Official,
            false,
        )
    }

    async fn mock_feed() -> MockServer {
        mock_feed_with_delay(Duration::ZERO).await
    }

    async fn mock_feed_with_delay(delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        let body = format!(
            "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>T</title>\
             <link>https://example.com</link><description>d</description>\
             <item><title>AI Summit 2026 begins</title><link>https://example.com/a</link>\
             <pubDate>{}</pubDate></item></channel></rss>",
            now().to_rfc2822()
        );
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body).set_delay(delay))
            .mount(&server)
            .await;
        server
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.map_or(0, |r| r.len())
    }

    #[tokio::test]
    async fn test_cold_cache_aggregates_inline() {
        let server = mock_feed().await;
        let cache = create_test_cache(vec![mock_source(&server)]);

        assert!(cache.snapshot().await.is_none());
        let items = cache.items().await.unwrap();
        assert_eq!(items.len(), 1);

        let snapshot = cache.snapshot().await.unwrap();
        assert_eq!(snapshot.refreshed_at, now());
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let server = mock_feed().await;
        let cache = create_test_cache(vec![mock_source(&server)]);

        assert!(cache.refresh().await.unwrap());
        assert!(!cache.is_refreshing().await);
        assert_eq!(cache.snapshot().await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_skipped_while_running() {
        let cache = create_test_cache(Vec::new());
        *cache.refreshing.write().await = true;

        assert!(!cache.refresh().await.unwrap());
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_snapshot() {
        let cache = create_test_cache(vec![Source::new(
            "dead",
            "Dead",
            "http://127.0.0.1:9/rss",
            Region::Global,
            true,
        )]);

        let items = cache.items().await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_cold_reads_share_one_aggregation() {
        let server = mock_feed_with_delay(Duration::from_millis(300)).await;
        let cache = create_test_cache(vec![mock_source(&server)]);

        let (a, b, c) = tokio::join!(cache.items(), cache.items(), cache.items());
        assert_eq!(a.unwrap().len(), 1);
        assert_eq!(b.unwrap().len(), 1);
        assert_eq!(c.unwrap().len(), 1);
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_cold_read_waits_for_running_refresh() {
        let server = mock_feed_with_delay(Duration::from_millis(300)).await;
        let cache = create_test_cache(vec![mock_source(&server)]);

        let (refreshed, items) = tokio::join!(cache.refresh(), cache.items());
        assert!(refreshed.unwrap());
        assert_eq!(items.unwrap().len(), 1);
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_panicking_batch_is_a_pipeline_error() {
        let server = mock_feed().await;
        let cache = create_test_cache_with_fetch_clock(
            vec![mock_source(&server)],
            Arc::new(BrokenClock),
        );

        let result = cache.items().await;
        assert!(matches!(result, Err(PipelineError::Aggregation(_))));
        assert!(cache.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_flag() {
        let server = mock_feed().await;
        let cache = create_test_cache_with_fetch_clock(
            vec![mock_source(&server)],
            Arc::new(BrokenClock),
        );

        assert!(cache.refresh().await.is_err());
        assert!(!cache.is_refreshing().await);
    }
}
