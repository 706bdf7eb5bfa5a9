use serde::Deserialize;
use std::path::Path;

use crate::calendar::ConferenceCalendar;
use crate::classifier::KeywordSet;
use crate::sources::{Source, SourceRegistry};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Refresh interval in minutes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub conference: ConferenceCalendar,
    #[serde(default)]
    pub keywords: KeywordSet,
    /// Empty means the built-in catalog.
    #[serde(default)]
    pub sources: Vec<Source>,
}

fn default_refresh_interval() -> u64 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Entries older than this many days are dropped
    #[serde(default = "default_recency_days")]
    pub recency_days: i64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_user_agent() -> String {
    "Mozilla/5.0 AISummit2026/1.0".to_string()
}

fn default_recency_days() -> i64 {
    10
}

fn default_max_items() -> usize {
    150
}

fn default_summary_max_chars() -> usize {
    400
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            recency_days: default_recency_days(),
            max_items: default_max_items(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

/// One day; longer intervals leave the feed stale for the whole event.
const MAX_REFRESH_INTERVAL: u64 = 24 * 60;
const MAX_RECENCY_DAYS: i64 = 365;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_REFRESH_INTERVAL).contains(&self.refresh_interval),
            "refresh_interval must be between 1 and {} minutes, got {}",
            MAX_REFRESH_INTERVAL,
            self.refresh_interval
        );
        anyhow::ensure!(
            (1..=MAX_RECENCY_DAYS).contains(&self.fetch.recency_days),
            "fetch.recency_days must be between 1 and {}, got {}",
            MAX_RECENCY_DAYS,
            self.fetch.recency_days
        );
        Ok(())
    }

    pub fn registry(&self) -> SourceRegistry {
        if self.sources.is_empty() {
            SourceRegistry::builtin()
        } else {
            SourceRegistry::new(self.sources.clone())
        }
    }
}
