use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::dedup::dedupe_by_url;
use crate::normalize::needs_real_image;
use crate::types::Article;

#[derive(Debug, Clone, Copy)]
pub struct MergePolicy {
    pub retention: Duration,
    pub max_total: usize,
}

/// Combine this cycle's articles with what the cache already held.
///
/// Fresh copies replace cached ones with the same URL, except that
/// enrichment already paid for is kept: `ai_categories` falls back to the
/// cached value, and a real cached image beats a fresh placeholder. Cached
/// articles past the retention window are dropped; fresh ones never are.
/// The result is newest first and at most `max_total` long.
pub fn merge(fresh: Vec<Article>, cached: Vec<Article>, policy: MergePolicy, now: DateTime<Utc>) -> Vec<Article> {
    let cutoff = chrono::Duration::from_std(policy.retention)
        .ok()
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut cached_by_url: HashMap<String, Article> = HashMap::with_capacity(cached.len());
    for article in cached.into_iter().filter(|a| a.date >= cutoff) {
        cached_by_url.entry(article.url.clone()).or_insert(article);
    }

    let fresh = dedupe_by_url(fresh);
    let mut merged = Vec::with_capacity(fresh.len() + cached_by_url.len());
    for article in fresh {
        match cached_by_url.remove(&article.url) {
            Some(previous) => merged.push(merge_one(article, previous)),
            None => merged.push(article),
        }
    }
    merged.extend(cached_by_url.into_values());

    merged.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url.cmp(&b.url)));
    merged.truncate(policy.max_total);
    merged
}

fn merge_one(mut fresh: Article, cached: Article) -> Article {
    fresh.ai_categories = fresh.ai_categories.or(cached.ai_categories);
    if needs_real_image(fresh.image.as_deref()) && !needs_real_image(cached.image.as_deref()) {
        fresh.image = cached.image;
    }
    fresh
}
