use chrono::{DateTime, NaiveDateTime, Utc};
use html2text::render::TrivialDecorator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    News,
    Quote,
    Update,
}

impl CardType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "news" => Some(Self::News),
            "quote" => Some(Self::Quote),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// Single topic label attached to every item. `General` is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TopicTag {
    Policy,
    Startups,
    Research,
    Keynotes,
    Funding,
    Ethics,
    Infrastructure,
    #[default]
    General,
}

impl TopicTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Startups => "startups",
            Self::Research => "research",
            Self::Keynotes => "keynotes",
            Self::Funding => "funding",
            Self::Ethics => "ethics",
            Self::Infrastructure => "infrastructure",
            Self::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "policy" => Some(Self::Policy),
            "startups" => Some(Self::Startups),
            "research" => Some(Self::Research),
            "keynotes" => Some(Self::Keynotes),
            "funding" => Some(Self::Funding),
            "ethics" => Some(Self::Ethics),
            "infrastructure" => Some(Self::Infrastructure),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// One entry as read from a feed document, before filtering.
#[derive(Debug, Clone, Default)]
pub struct RawFeedEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// `None` when the feed gave no date or one that could not be parsed.
    pub published: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

/// The unit served to readers, whether aggregated or curated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CardType,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub published_at: DateTime<Utc>,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_tag: Option<String>,
    pub topic_tag: TopicTag,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub breaking: bool,
    #[serde(default)]
    pub manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curator_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Parse the timestamp formats seen in feeds and in the story table.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite CURRENT_TIMESTAMP, always UTC
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Reduce feed markup to a plain-text snippet of at most `max_chars` characters.
///
/// Tags are dropped and entities decoded; a `<` that opens no tag is kept as text.
pub fn clean_summary(raw: &str, max_chars: usize) -> String {
    // Wide enough that html2text never wraps inside a word
    let width = raw.len().max(80);
    let text = html2text::from_read_with_decorator(raw.as_bytes(), width, TrivialDecorator::new())
        .unwrap_or_else(|_| raw.to_string());

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}
