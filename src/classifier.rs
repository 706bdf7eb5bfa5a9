//! Keyword relevance gate and topic labelling.
//!
//! Matching is case-insensitive substring matching over `title + " " + summary`.
//! No tokenisation, stemming or scoring.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::model::TopicTag;
use crate::sources::Source;

pub const PRIMARY_KEYWORDS: &[&str] = &[
    "AI Summit",
    "AISummitDelhi",
    "AI Summit Delhi",
    "AISummit2026",
    "AI Summit 2026",
    "MeitY",
    "NASSCOM",
    "Digital India AI",
    "India AI Mission",
    "Niti Aayog AI",
];

pub const AI_KEYWORDS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "generative AI",
    "large language model",
    "LLM",
    "ChatGPT",
    "OpenAI",
    "Google AI",
    "Google DeepMind",
    "Microsoft AI",
    "Anthropic",
    "AI regulation",
    "AI policy",
    "AI governance",
    "foundation model",
];

pub const REGIONAL_KEYWORDS: &[&str] = &[
    "India",
    "Indian",
    "Delhi",
    "Mumbai",
    "Bangalore",
    "Bengaluru",
    "New Delhi",
    "Asia",
    "South Asia",
    "NASSCOM",
    "MeitY",
    "Infosys",
    "TCS",
    "Wipro",
    "Reliance",
];

// Checked top to bottom; the first group that matches wins.
const TOPIC_RULES: &[(TopicTag, &str)] = &[
    (
        TopicTag::Policy,
        r"polic|regulat|govern|law|ministry|minister|government|meity",
    ),
    (
        TopicTag::Startups,
        r"startup|funding|investment|venture|seed|series [a-z]|raise",
    ),
    (
        TopicTag::Research,
        r"research|paper|study|lab|model|benchmark|dataset",
    ),
    (
        TopicTag::Keynotes,
        r"keynote|opening|closing|inaugural|plenary",
    ),
    (TopicTag::Funding, r"fund|invest|capital|valuation|ipo"),
    (
        TopicTag::Ethics,
        r"ethic|bias|fair|safe|harm|responsib|trust",
    ),
    (
        TopicTag::Infrastructure,
        r"infrastructure|data center|chip|hardware|cloud|compute",
    ),
];

static TOPIC_PATTERNS: LazyLock<Vec<(TopicTag, Regex)>> = LazyLock::new(|| {
    TOPIC_RULES
        .iter()
        .map(|(tag, pattern)| (*tag, Regex::new(pattern).expect("topic pattern is valid")))
        .collect()
});

/// The three keyword lists behind the inclusion test.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordSet {
    #[serde(default = "default_primary")]
    pub primary: Vec<String>,
    #[serde(default = "default_ai")]
    pub ai: Vec<String>,
    #[serde(default = "default_regional")]
    pub regional: Vec<String>,
}

fn to_owned_list(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_primary() -> Vec<String> {
    to_owned_list(PRIMARY_KEYWORDS)
}

fn default_ai() -> Vec<String> {
    to_owned_list(AI_KEYWORDS)
}

fn default_regional() -> Vec<String> {
    to_owned_list(REGIONAL_KEYWORDS)
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            ai: default_ai(),
            regional: default_regional(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    primary: Vec<String>,
    ai: Vec<String>,
    regional: Vec<String>,
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn matches_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

impl Classifier {
    pub fn new(keywords: &KeywordSet) -> Self {
        Self {
            primary: lowered(&keywords.primary),
            ai: lowered(&keywords.ai),
            regional: lowered(&keywords.regional),
        }
    }

    /// Decide whether an entry belongs in the aggregated feed.
    ///
    /// A primary keyword admits the entry outright. Otherwise the text needs
    /// both an AI term and a regional term. `source.filter_strict` does not
    /// change the outcome.
    pub fn should_include(&self, title: &str, summary: &str, _source: &Source) -> bool {
        let text = format!("{} {}", title, summary).to_lowercase();

        if matches_any(&text, &self.primary) {
            return true;
        }

        matches_any(&text, &self.ai) && matches_any(&text, &self.regional)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&KeywordSet::default())
    }
}

/// Pick the single topic that best describes `text`.
pub fn detect_topic(text: &str) -> TopicTag {
    let lower = text.to_lowercase();
    TOPIC_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&lower))
        .map(|(tag, _)| *tag)
        .unwrap_or(TopicTag::General)
}
