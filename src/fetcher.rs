use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use crate::calendar::{Clock, ConferenceCalendar};
use crate::classifier::{detect_topic, Classifier};
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::model::{clean_summary, CardType, NewsItem, RawFeedEntry};
use crate::sources::Source;

/// Fetches one source at a time and turns its entries into `NewsItem`s.
pub struct Fetcher {
    client: Client,
    classifier: Arc<Classifier>,
    calendar: Arc<ConferenceCalendar>,
    clock: Arc<dyn Clock>,
    recency: chrono::Duration,
    summary_max_chars: usize,
}

impl Fetcher {
    pub fn new(
        config: &FetchConfig,
        classifier: Arc<Classifier>,
        calendar: Arc<ConferenceCalendar>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let recency = chrono::Duration::try_days(config.recency_days)
            .ok_or_else(|| anyhow::anyhow!("recency_days out of range: {}", config.recency_days))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            classifier,
            calendar,
            clock,
            recency,
            summary_max_chars: config.summary_max_chars,
        })
    }

    /// Download and normalise one feed. Errors are returned, not logged away.
    pub async fn fetch_feed(&self, source: &Source) -> Result<Vec<NewsItem>, FetchError> {
        debug!("Fetching feed: {} ({})", source.name, source.url);

        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: source.url.clone(),
            });
        }
        let bytes = response.bytes().await?;

        let items = self.parse_feed(source, &bytes)?;
        info!("Kept {} items from '{}'", items.len(), source.name);
        Ok(items)
    }

    pub fn parse_feed(&self, source: &Source, bytes: &[u8]) -> Result<Vec<NewsItem>, FetchError> {
        let parsed = parser::parse(bytes)?;
        Ok(self.normalize(source, parsed.entries.into_iter().map(Self::raw_entry)))
    }

    pub fn raw_entry(entry: Entry) -> RawFeedEntry {
        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();

        let summary = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        let link = match entry.links.first() {
            Some(l) => l.href.clone(),
            None if entry.id.starts_with("http://") || entry.id.starts_with("https://") => {
                entry.id.clone()
            }
            None => String::new(),
        };

        let image_url = entry
            .media
            .iter()
            .flat_map(|m| m.content.iter())
            .find_map(|c| c.url.as_ref())
            .map(|u| u.to_string());

        RawFeedEntry {
            title,
            summary,
            link,
            published: entry.published.or(entry.updated),
            image_url,
        }
    }

    /// Apply the recency cutoff, title requirement and inclusion test, then map
    /// survivors to items.
    pub fn normalize(
        &self,
        source: &Source,
        entries: impl IntoIterator<Item = RawFeedEntry>,
    ) -> Vec<NewsItem> {
        let now = self.clock.now();
        let cutoff = now
            .checked_sub_signed(self.recency)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut items = Vec::new();
        for entry in entries {
            // Undated entries count as fresh
            if entry.published.is_some_and(|published| published < cutoff) {
                continue;
            }

            if entry.title.is_empty() {
                continue;
            }

            let summary = clean_summary(&entry.summary, self.summary_max_chars);
            if !self.classifier.should_include(&entry.title, &summary, source) {
                debug!("Filtered out '{}' from '{}'", entry.title, source.name);
                continue;
            }

            items.push(self.to_item(source, entry, summary, now));
        }
        items
    }

    fn to_item(
        &self,
        source: &Source,
        entry: RawFeedEntry,
        summary: String,
        now: DateTime<Utc>,
    ) -> NewsItem {
        let published_at = entry.published.unwrap_or(now);
        let day = match self.calendar.day_of(published_at) {
            0 => 1,
            day => day,
        };
        let topic_tag = detect_topic(&format!("{} {}", entry.title, summary));
        let id = generate_id(&source.id, &entry.link, &entry.title);
        let summary = if summary.is_empty() {
            entry.title.clone()
        } else {
            summary
        };

        NewsItem {
            id,
            kind: CardType::News,
            source: source.name.clone(),
            source_url: Some(source.url.clone()),
            title: entry.title,
            summary,
            link: Some(entry.link).filter(|l| !l.is_empty()),
            published_at,
            day,
            session_tag: None,
            topic_tag,
            featured: false,
            pinned: false,
            breaking: false,
            manual: false,
            curator_note: None,
            speaker: None,
            speaker_title: None,
            image_url: entry.image_url,
        }
    }
}

/// Stable id for an aggregated article: a 32-bit `h * 31 + c` hash over the
/// UTF-16 units of `"{source_id}-{link or title}"`, base 36.
pub fn generate_id(source_id: &str, link: &str, title: &str) -> String {
    let key = if link.is_empty() { title } else { link };
    let hash = format!("{}-{}", source_id, key)
        .encode_utf16()
        .fold(0i32, |h, unit| {
            h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
        });
    format!("rss-{}", to_base36(i64::from(hash).unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
