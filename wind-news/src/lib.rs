pub mod aggregator;
pub mod cache;
pub mod classify;
pub mod dedup;
pub mod enrich;
pub mod fetcher;
pub mod llm_adapter;
pub mod merge;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod relevance;
pub mod scheduler;
pub mod sources;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use aggregator::{HealthStatus, NewsAggregator, RefreshResponse};
pub use cache::ArticleCache;
pub use enrich::{AiCategorizer, EnrichmentCoordinator, ImageEnricher};
pub use fetcher::Fetcher;
pub use llm_adapter::{GeminiAdapter, LlmAdapter, MockLlmAdapter};
pub use parser::FeedParser;
pub use pipeline::NewsPipeline;
pub use query::{ArticleQuery, ArticlesResponse};
pub use scheduler::{RefreshOutcome, RefreshScheduler, RefreshTrigger, SchedulerState};
pub use sources::RssFeedSource;
pub use traits::PullFeed;
