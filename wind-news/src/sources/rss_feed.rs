use crate::sources::feed_context;
use crate::traits::PullFeed;
use crate::types::FeedOutcome;
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// An RSS or Atom feed reached over HTTP.
pub struct RssFeedSource {
    pub url: String,
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(url: impl Into<String>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            url: url.into(),
            fetcher,
            parser: FeedParser::new(),
        }
    }
}

#[async_trait]
impl PullFeed for RssFeedSource {
    fn feed_url(&self) -> &str {
        &self.url
    }

    async fn pull(&self) -> FeedOutcome {
        let fetch_result = self.fetcher.fetch_feed(&self.url).await;

        let content = match (fetch_result.success, fetch_result.content) {
            (true, Some(content)) => content,
            (_, _) => {
                let error = fetch_result.error.unwrap_or_else(|| "Fetch returned no content".to_string());
                return FeedOutcome {
                    context: feed_context(&self.url, None),
                    items: Vec::new(),
                    error: Some(error),
                };
            }
        };

        match self.parser.parse_feed(&content) {
            Ok(parsed) => {
                info!("Pulled {} items from {}", parsed.items.len(), self.url);
                FeedOutcome {
                    context: feed_context(&self.url, parsed.title.as_deref()),
                    items: parsed.items,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Treating unparsable feed {} as empty: {}", self.url, e);
                FeedOutcome {
                    context: feed_context(&self.url, None),
                    items: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
