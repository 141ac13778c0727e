use crate::types::{Article, Province, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Filters and paging for the served article list. Empty filter lists
/// mean "everything".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleQuery {
    pub provinces: Vec<Province>,
    pub tags: Vec<Tag>,
    pub search: Option<String>,
    /// 1-based; 0 is treated as 1.
    pub page: usize,
    /// 0 means the service default.
    pub page_size: usize,
    pub force_refresh: bool,
}

impl ArticleQuery {
    pub fn matches(&self, article: &Article) -> bool {
        if !self.provinces.is_empty() && !self.provinces.contains(&article.province) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| article.tags.contains(tag)) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                article.title.to_lowercase().contains(&needle)
                    || article.description.to_lowercase().contains(&needle)
                    || article.source.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleCounts {
    pub offshore: usize,
    pub onshore: usize,
    pub planning: usize,
    pub construction: usize,
    pub by_province: BTreeMap<Province, usize>,
}

pub fn count_articles(articles: &[Article]) -> ArticleCounts {
    let mut counts = ArticleCounts::default();
    for article in articles {
        for tag in &article.tags {
            match tag {
                Tag::Offshore => counts.offshore += 1,
                Tag::Onshore => counts.onshore += 1,
                Tag::Planning => counts.planning += 1,
                Tag::Construction => counts.construction += 1,
            }
        }
        *counts.by_province.entry(article.province).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
    pub last_update: Option<DateTime<Utc>>,
    /// Articles on this page.
    pub count: usize,
    /// Articles matching the filters, across all pages.
    pub total_articles: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Served from the stored snapshot without refreshing.
    pub cached: bool,
    /// Articles the refresh triggered by this request produced.
    pub fresh: usize,
    pub ai_categorized: usize,
    pub counts: ArticleCounts,
    pub processing_time_ms: u64,
}

pub struct Page {
    pub articles: Vec<Article>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

pub fn paginate(articles: Vec<Article>, page: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let page = page.max(1);
    let total_pages = articles.len().div_ceil(page_size);
    let articles = articles.into_iter().skip((page - 1).saturating_mul(page_size)).take(page_size).collect();
    Page { articles, page, page_size, total_pages }
}
