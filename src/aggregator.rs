use std::collections::HashSet;

use futures::future::join_all;
use tracing::{info, warn};

use crate::fetcher::Fetcher;
use crate::model::NewsItem;
use crate::sources::Source;

/// Fans a fetch out over every source and folds the survivors into one list.
pub struct Aggregator {
    fetcher: Fetcher,
    max_items: usize,
}

impl Aggregator {
    pub fn new(fetcher: Fetcher, max_items: usize) -> Self {
        Self { fetcher, max_items }
    }

    /// Best effort: failed sources are logged and contribute nothing.
    pub async fn aggregate(&self, sources: &[Source]) -> Vec<NewsItem> {
        info!("Aggregating {} sources", sources.len());

        let results = join_all(sources.iter().map(|source| async move {
            (source, self.fetcher.fetch_feed(source).await)
        }))
        .await;

        let mut batches = Vec::with_capacity(results.len());
        for (source, result) in results {
            match result {
                Ok(items) => batches.push(items),
                Err(e) => warn!(source = %source.id, error = %e, "Dropping failed source"),
            }
        }
        info!(
            "{}/{} sources fetched successfully",
            batches.len(),
            sources.len()
        );

        let items = dedup_and_rank(batches, self.max_items);
        info!("Aggregation produced {} items", items.len());
        items
    }
}

/// Drop repeats by link or id (first seen wins), sort newest first, cap at `max_items`.
pub fn dedup_and_rank(
    batches: impl IntoIterator<Item = Vec<NewsItem>>,
    max_items: usize,
) -> Vec<NewsItem> {
    let mut seen_links = HashSet::new();
    let mut seen_ids = HashSet::new();
    let mut items = Vec::new();

    for item in batches.into_iter().flatten() {
        if let Some(link) = item.link.as_deref() {
            if seen_links.contains(link) {
                continue;
            }
        }
        if seen_ids.contains(&item.id) {
            continue;
        }

        if let Some(link) = &item.link {
            seen_links.insert(link.clone());
        }
        seen_ids.insert(item.id.clone());
        items.push(item);
    }

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items.truncate(max_items);
    items
}
