use crate::cache::ArticleCache;
use crate::dedup::dedupe;
use crate::enrich::EnrichmentCoordinator;
use crate::merge::{merge, MergePolicy};
use crate::normalize::{classification_text, normalize};
use crate::relevance::is_energy_relevant;
use crate::traits::PullFeed;
use crate::types::{Article, CacheSnapshot, FeedOutcome, ImagePolicy, PipelineConfig, RefreshReport};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Counts from turning feed outcomes into articles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectStats {
    pub items_seen: usize,
    pub items_rejected: usize,
    pub items_filtered: usize,
}

/// Normalize every item of every outcome, in feed order. Items that fail
/// normalization are counted and skipped; items from local general-news
/// outlets must also pass the energy filter.
pub fn collect_articles(
    outcomes: Vec<FeedOutcome>,
    fetched_at: DateTime<Utc>,
    policy: ImagePolicy,
) -> (Vec<Article>, CollectStats) {
    let mut stats = CollectStats::default();
    let mut articles = Vec::new();

    for outcome in outcomes {
        let ctx = outcome.context;
        for raw in outcome.items {
            stats.items_seen += 1;
            let relevant = !ctx.is_local_source || is_energy_relevant(&classification_text(&raw));
            let article = match normalize(raw, &ctx, fetched_at, policy) {
                Ok(article) => article,
                Err(e) => {
                    debug!("Skipping item from {}: {}", ctx.feed_url, e);
                    stats.items_rejected += 1;
                    continue;
                }
            };
            if !relevant {
                stats.items_filtered += 1;
                continue;
            }
            articles.push(article);
        }
    }

    (articles, stats)
}

/// One full refresh: fetch, normalize, filter, dedupe, merge with the
/// cache, enrich, persist.
pub struct NewsPipeline {
    sources: Vec<Box<dyn PullFeed>>,
    cache: ArticleCache,
    enrichment: EnrichmentCoordinator,
    config: PipelineConfig,
}

impl NewsPipeline {
    pub fn new(cache: ArticleCache, config: PipelineConfig) -> Self {
        Self {
            sources: Vec::new(),
            cache,
            enrichment: EnrichmentCoordinator::new(),
            config,
        }
    }

    /// Add a new content source to the pipeline
    pub fn add_source(&mut self, source: Box<dyn PullFeed>) {
        info!("Adding source to pipeline: {}", source.feed_url());
        self.sources.push(source);
    }

    pub fn with_enrichment(mut self, enrichment: EnrichmentCoordinator) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn ai_enabled(&self) -> bool {
        self.enrichment.has_ai()
    }

    pub async fn run_cycle(&self) -> RefreshReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let started_at = Utc::now();
        info!("Refresh {} starting with {} feeds", run_id, self.sources.len());

        let outcomes = join_all(self.sources.iter().map(|source| source.pull())).await;
        let feeds_failed = outcomes.iter().filter(|o| o.failed()).count();
        for outcome in outcomes.iter().filter(|o| o.failed()) {
            warn!(
                "Feed {} yielded nothing: {}",
                outcome.context.feed_url,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }

        let (collected, stats) = collect_articles(outcomes, started_at, self.config.image_policy);
        let fresh = dedupe(collected, self.config.dedupe_mode);
        let fresh_articles = fresh.len();
        info!(
            "Refresh {}: {} items seen, {} rejected, {} off-topic, {} unique",
            run_id, stats.items_seen, stats.items_rejected, stats.items_filtered, fresh_articles
        );

        let cached = self.cache.load().await.map(|s| s.articles).unwrap_or_default();
        let policy = MergePolicy { retention: self.config.retention, max_total: self.config.max_total };
        let mut merged = merge(fresh, cached, policy, Utc::now());

        let enrichment = self.enrichment.enrich(&mut merged).await;

        // Saved even when every feed failed: the merge still expires old items.
        let merged_articles = merged.len();
        let snapshot = CacheSnapshot { articles: merged, updated_at: Utc::now() };
        let cache_written = self.cache.save(&snapshot).await;
        if !cache_written {
            error!("Refresh {} could not persist {} articles", run_id, merged_articles);
        }

        let report = RefreshReport {
            run_id,
            started_at,
            feeds_total: self.sources.len(),
            feeds_failed,
            items_seen: stats.items_seen,
            items_rejected: stats.items_rejected,
            items_filtered: stats.items_filtered,
            fresh_articles,
            merged_articles,
            cache_written,
            enrichment,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Refresh {} done in {}ms: {} articles cached ({} feeds failed)",
            run_id, report.duration_ms, merged_articles, feeds_failed
        );
        report
    }
}
