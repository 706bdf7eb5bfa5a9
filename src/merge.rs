use std::collections::HashSet;

use crate::model::NewsItem;

/// Combine curated and aggregated items into the served order:
/// pinned, then breaking, then other curated items, then aggregated items.
///
/// Each curated tier keeps its upstream order and aggregated items keep their
/// recency order. Later duplicates of an id are dropped.
pub fn merge(
    manual: Vec<NewsItem>,
    aggregated: impl IntoIterator<Item = NewsItem>,
) -> Vec<NewsItem> {
    let (pinned, rest): (Vec<_>, Vec<_>) = manual.into_iter().partition(|i| i.pinned);
    let (breaking, other): (Vec<_>, Vec<_>) = rest.into_iter().partition(|i| i.breaking);

    let mut seen = HashSet::new();
    pinned
        .into_iter()
        .chain(breaking)
        .chain(other)
        .chain(aggregated)
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}
