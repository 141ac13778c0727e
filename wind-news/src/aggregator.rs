use crate::cache::ArticleCache;
use crate::query::{count_articles, paginate, ArticleQuery, ArticlesResponse};
use crate::scheduler::{RefreshOutcome, RefreshScheduler, RefreshTrigger, SchedulerState};
use crate::types::{AggregatorError, Article, CacheSnapshot, Result, ServiceConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub last_fetch: Option<DateTime<Utc>>,
    pub article_count: usize,
    pub is_fetching: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    /// True when a cycle was already running and this request did nothing.
    pub skipped: bool,
    pub articles_processed: usize,
    pub total_articles: usize,
    pub ai_categorized: usize,
    pub timestamp: DateTime<Utc>,
}

/// Read side of the service: what the dashboard asks for.
pub struct NewsAggregator {
    scheduler: Arc<RefreshScheduler>,
    config: ServiceConfig,
}

impl NewsAggregator {
    pub fn new(scheduler: Arc<RefreshScheduler>, config: ServiceConfig) -> Self {
        Self { scheduler, config }
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    fn cache(&self) -> &ArticleCache {
        self.scheduler.pipeline().cache()
    }

    fn is_fresh(&self, snapshot: &CacheSnapshot, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.config.fresh_for) {
            Ok(fresh_for) => now.signed_duration_since(snapshot.updated_at) < fresh_for,
            Err(_) => true,
        }
    }

    /// Serve the stored snapshot while it is fresh; otherwise refresh first.
    pub async fn get_articles(&self, query: ArticleQuery) -> ArticlesResponse {
        let started = Instant::now();
        let stored = self.cache().load().await;
        let stale = stored.as_ref().map_or(true, |s| !self.is_fresh(s, Utc::now()));

        let (snapshot, cached, fresh) = if query.force_refresh || stale {
            match self.scheduler.trigger(RefreshTrigger::Manual).await {
                RefreshOutcome::Completed(report) => {
                    let reloaded = self.cache().load().await.or(stored);
                    (reloaded, false, report.fresh_articles)
                }
                RefreshOutcome::Skipped => (stored, true, 0),
            }
        } else {
            (stored, true, 0)
        };

        let last_update = snapshot.as_ref().map(|s| s.updated_at);
        let all = snapshot.map(|s| s.articles).unwrap_or_default();
        let matching: Vec<Article> = all.into_iter().filter(|a| query.matches(a)).collect();
        let counts = count_articles(&matching);
        let ai_categorized = matching.iter().filter(|a| a.ai_categories.is_some()).count();
        let total_articles = matching.len();

        let page_size = match query.page_size {
            0 => self.config.default_page_size,
            n => n.min(self.config.max_page_size),
        };
        let page = paginate(matching, query.page, page_size);

        ArticlesResponse {
            count: page.articles.len(),
            articles: page.articles,
            last_update,
            total_articles,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            cached,
            fresh,
            ai_categorized,
            counts,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub async fn health(&self) -> HealthStatus {
        let snapshot = self.cache().load().await;
        HealthStatus {
            status: "ok".to_string(),
            last_fetch: snapshot.as_ref().map(|s| s.updated_at),
            article_count: snapshot.map_or(0, |s| s.articles.len()),
            is_fetching: self.scheduler.state() == SchedulerState::Fetching,
        }
    }

    /// Guarded by the same secret as [`Self::refresh`].
    pub async fn clear_cache(&self, authorization: Option<&str>) -> Result<bool> {
        if !self.authorize_refresh(authorization) {
            warn!("Rejected unauthorized cache clear");
            return Err(AggregatorError::Unauthorized);
        }
        let cleared = self.cache().clear().await;
        if cleared {
            info!("Article cache cleared");
        }
        Ok(cleared)
    }

    /// With no secret configured every caller is allowed.
    pub fn authorize_refresh(&self, authorization: Option<&str>) -> bool {
        let Some(secret) = self.config.refresh_secret.as_deref() else {
            return true;
        };
        let expected = format!("Bearer {}", secret);
        let presented = authorization.unwrap_or("").trim();
        presented.as_bytes().ct_eq(expected.as_bytes()).into()
    }

    /// Forced refresh on behalf of an external caller (cron, operator).
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<RefreshResponse> {
        if !self.authorize_refresh(authorization) {
            warn!("Rejected unauthorized refresh request");
            return Err(AggregatorError::Unauthorized);
        }
        let response = match self.scheduler.trigger(RefreshTrigger::Manual).await {
            RefreshOutcome::Completed(report) => RefreshResponse {
                success: report.cache_written,
                skipped: false,
                articles_processed: report.fresh_articles,
                total_articles: report.merged_articles,
                ai_categorized: report.enrichment.ai_categorized,
                timestamp: Utc::now(),
            },
            RefreshOutcome::Skipped => RefreshResponse {
                success: true,
                skipped: true,
                articles_processed: 0,
                total_articles: 0,
                ai_categorized: 0,
                timestamp: Utc::now(),
            },
        };
        Ok(response)
    }

    /// Background refresh loop; never returns.
    pub async fn run_scheduler(&self) {
        self.scheduler.run(self.config.refresh_interval).await
    }
}
