use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
// Use the interfaces crate for core types
pub use interfaces::defs::{AiCategories, Article, CacheSnapshot, Category, FeedContext, Province, RawFeedItem, Tag};
pub use interfaces::state::{FileStore, KeyValueStore, MemoryStore};

/// Result of one HTTP fetch of a feed. A failed fetch is data, not an error.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub success: bool,
    pub error: Option<String>,
    pub fetch_time: DateTime<Utc>,
    pub response_time_ms: u64,
    pub http_status: Option<u16>,
    pub content: Option<String>, // RSS/XML content
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Upper bound for a whole feed fetch, retries included.
    pub feed_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    /// Browser-like agent used when scraping article pages.
    pub page_user_agent: String,
    pub page_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "WindNews/1.0 (+RSS reader)".to_string(),
            feed_timeout: Duration::from_millis(3000),
            max_retries: 1,
            retry_delay: Duration::from_millis(250),
            max_feed_size_mb: 10,
            max_redirects: 5,
            page_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            page_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub items: Vec<RawFeedItem>,
}

/// What happened to one configured feed during a cycle.
#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub context: FeedContext,
    pub items: Vec<RawFeedItem>,
    pub error: Option<String>,
}

impl FeedOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
    Standard,
    #[default]
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupeMode {
    UrlOnly,
    #[default]
    UrlThenTitle,
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub enrich_images: bool,
    pub image_limit: usize,
    pub image_batch_size: usize,
    pub image_batch_delay: Duration,
    pub min_image_width: u32,
    pub ai_max_articles: usize,
    pub ai_batch_size: usize,
    pub ai_max_retries: u32,
    pub ai_retry_delay: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enrich_images: true,
            image_limit: 30,
            image_batch_size: 5,
            image_batch_delay: Duration::from_millis(500),
            min_image_width: 200,
            ai_max_articles: 40,
            ai_batch_size: 40,
            ai_max_retries: 2,
            ai_retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub retention: Duration,
    pub max_total: usize,
    pub dedupe_mode: DedupeMode,
    pub image_policy: ImagePolicy,
    pub cache_ttl: Duration,
    pub cache_op_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            max_total: 400,
            dedupe_mode: DedupeMode::default(),
            image_policy: ImagePolicy::default(),
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cache_op_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// A snapshot younger than this is served without refreshing.
    pub fresh_for: Duration,
    pub refresh_interval: Duration,
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub refresh_secret: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            fresh_for: Duration::from_secs(15 * 60),
            refresh_interval: Duration::from_secs(15 * 60),
            default_page_size: 20,
            max_page_size: 100,
            refresh_secret: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentReport {
    pub images_attempted: usize,
    pub images_found: usize,
    pub ai_requested: usize,
    pub ai_categorized: usize,
    pub ai_batches_failed: usize,
}

/// Summary of one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub feeds_total: usize,
    pub feeds_failed: usize,
    pub items_seen: usize,
    pub items_rejected: usize,
    pub items_filtered: usize,
    pub fresh_articles: usize,
    pub merged_articles: usize,
    pub cache_written: bool,
    pub enrichment: EnrichmentReport,
    pub duration_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Timed out after {millis}ms: {what}")]
    Timeout { what: String, millis: u64 },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
