use std::sync::Arc;

use serde::Deserialize;

/// Where a feed's coverage comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    India,
    Global,
    Official,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: String,
    pub region: Region,
    /// Carried for every source but not consulted by the inclusion test.
    #[serde(default)]
    pub filter_strict: bool,
    #[serde(default)]
    pub logo: Option<String>,
}

impl Source {
    pub fn new(id: &str, name: &str, url: &str, region: Region, filter_strict: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            region,
            filter_strict,
            logo: None,
        }
    }
}

/// Immutable, ordered catalog of feed sources. Cloning shares the list.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Arc<[Source]>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources: sources.into(),
        }
    }

    /// The catalog the service ships with.
    pub fn builtin() -> Self {
        Self::new(builtin_sources())
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }
}

const BUILTIN: &[(&str, &str, &str, Region, bool)] = &[
    // Global AI desks
    (
        "techcrunch-ai",
        "TechCrunch",
        "https://techcrunch.com/category/artificial-intelligence/feed/",
        Region::Global,
        true,
    ),
    (
        "theverge-ai",
        "The Verge",
        "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml",
        Region::Global,
        true,
    ),
    (
        "wired-ai",
        "Wired",
        "https://www.wired.com/feed/tag/ai/latest/rss",
        Region::Global,
        true,
    ),
    (
        "mit-tech-review",
        "MIT Tech Review",
        "https://www.technologyreview.com/feed/",
        Region::Global,
        true,
    ),
    (
        "venturebeat-ai",
        "VentureBeat",
        "https://venturebeat.com/category/ai/feed/",
        Region::Global,
        true,
    ),
    (
        "arstechnica",
        "Ars Technica",
        "https://feeds.arstechnica.com/arstechnica/technology-lab",
        Region::Global,
        true,
    ),
    // Indian tech press
    (
        "the-hindu-tech",
        "The Hindu",
        "https://www.thehindu.com/sci-tech/technology/feeder/default.rss",
        Region::India,
        false,
    ),
    ("inc42", "Inc42", "https://inc42.com/feed/", Region::India, false),
    (
        "yourstory",
        "YourStory",
        "https://yourstory.com/feed",
        Region::India,
        false,
    ),
    (
        "et-tech",
        "Economic Times",
        "https://economictimes.indiatimes.com/tech/rss.cms",
        Region::India,
        false,
    ),
    (
        "gadgets360",
        "Gadgets360",
        "https://feeds.feedburner.com/gadgets360-latest",
        Region::India,
        false,
    ),
    (
        "livemint-tech",
        "LiveMint",
        "https://www.livemint.com/rss/technology",
        Region::India,
        false,
    ),
    (
        "bs-tech",
        "Business Standard",
        "https://www.business-standard.com/rss/technology-10.rss",
        Region::India,
        false,
    ),
    (
        "analytics-india",
        "Analytics India",
        "https://analyticsindiamag.com/feed/",
        Region::India,
        false,
    ),
    (
        "hindustan-times-tech",
        "Hindustan Times",
        "https://www.hindustantimes.com/feeds/rss/technology/rssfeed.xml",
        Region::India,
        false,
    ),
    // Government
    (
        "pib",
        "PIB India",
        "https://pib.gov.in/RssMain.aspx?ModId=6&Lang=1&Regid=3",
        Region::Official,
        false,
    ),
];

pub fn builtin_sources() -> Vec<Source> {
    BUILTIN
        .iter()
        .map(|&(id, name, url, region, strict)| Source::new(id, name, url, region, strict))
        .collect()
}
