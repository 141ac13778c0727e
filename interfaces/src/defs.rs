use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Province {
    Munster,
    Leinster,
    Connacht,
    Ulster,
    National,
}

impl Province {
    pub const ALL: [Province; 5] = [
        Province::Munster,
        Province::Leinster,
        Province::Connacht,
        Province::Ulster,
        Province::National,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Province::Munster => "Munster",
            Province::Leinster => "Leinster",
            Province::Connacht => "Connacht",
            Province::Ulster => "Ulster",
            Province::National => "National",
        }
    }
}

impl fmt::Display for Province {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Province {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Province::ALL
            .into_iter()
            .find(|p| p.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("unknown province: {}", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Offshore,
    Onshore,
}

impl Category {
    pub fn as_tag(&self) -> Tag {
        match self {
            Category::Offshore => Tag::Offshore,
            Category::Onshore => Tag::Onshore,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Offshore,
    Onshore,
    Planning,
    Construction,
}

impl Tag {
    pub const ALL: [Tag; 4] = [Tag::Offshore, Tag::Onshore, Tag::Planning, Tag::Construction];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Offshore => "offshore",
            Tag::Onshore => "onshore",
            Tag::Planning => "planning",
            Tag::Construction => "construction",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown tag: {}", s))
    }
}

/// Categorization returned by the language model for one article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCategories {
    pub project_stage: String,
    pub sentiment: String,
    #[serde(default)]
    pub key_topics: Vec<String>,
    pub urgency: String,
}

/// One news story, normalized and classified. `url` is its identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub description: String,
    pub source: String,
    pub date: DateTime<Utc>,
    pub url: String,
    pub image: Option<String>,
    pub tags: BTreeSet<Tag>,
    pub category: Category,
    pub province: Province,
    #[serde(default)]
    pub ai_categories: Option<AiCategories>,
}

/// A feed entry as published, before any defaulting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub source: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedContext {
    pub feed_url: String,
    pub default_source: String,
    pub is_local_source: bool,
}

/// What the refresh cycle writes to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub articles: Vec<Article>,
    pub updated_at: DateTime<Utc>,
}

// Object style note:
// Everything above is plain data. Behaviour (classification, merging,
// enrichment) lives in the aggregator crate so these types can be shared
// with anything that only reads the cache.
