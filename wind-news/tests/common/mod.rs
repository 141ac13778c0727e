// Shared fixtures for the integration tests. Not every test file uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use wind_news::{
    ArticleCache, EnrichmentCoordinator, FetchConfig, Fetcher, KeyValueStore, MemoryStore, NewsPipeline,
    PipelineConfig, RssFeedSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init();
    });
}

pub struct FeedItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
}

pub fn item<'a>(title: &'a str, link: &'a str) -> FeedItem<'a> {
    FeedItem { title, link, description: "" }
}

/// Minimal RSS 2.0 document dated now. Values are inserted verbatim, so
/// keep them free of markup or pre-escape it.
pub fn rss(channel_title: &str, items: &[FeedItem<'_>]) -> String {
    let published = chrono::Utc::now().to_rfc2822();
    let body: String = items
        .iter()
        .map(|i| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>{}</description></item>",
                i.title, i.link, published, i.description
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{}</title><link>https://example.com</link><description>test</description>{}</channel></rss>"#,
        channel_title, body
    )
}

pub async fn mount_feed(server: &MockServer, route: &str, xml: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml).insert_header("content-type", "application/rss+xml"))
        .mount(server)
        .await;
}

pub fn test_fetcher() -> Arc<Fetcher> {
    let config = FetchConfig {
        feed_timeout: Duration::from_secs(2),
        max_retries: 0,
        page_timeout: Duration::from_secs(2),
        ..FetchConfig::default()
    };
    Arc::new(Fetcher::new(config).expect("http client"))
}

pub fn memory_cache(store: Arc<dyn KeyValueStore>) -> ArticleCache {
    let config = PipelineConfig::default();
    ArticleCache::new(store, config.cache_ttl, config.cache_op_timeout)
}

pub fn pipeline_for(feed_urls: &[String], cache: ArticleCache, enrichment: EnrichmentCoordinator) -> NewsPipeline {
    let fetcher = test_fetcher();
    let mut pipeline = NewsPipeline::new(cache, PipelineConfig::default()).with_enrichment(enrichment);
    for url in feed_urls {
        pipeline.add_source(Box::new(RssFeedSource::new(url.clone(), fetcher.clone())));
    }
    pipeline
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn clear(&self, key: &str) -> anyhow::Result<()> {
        self.inner.clear(key).await
    }
}
