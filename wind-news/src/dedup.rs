use std::collections::HashSet;

use crate::types::{Article, DedupeMode};

/// Exact-URL dedup. The first occurrence wins and order is preserved.
pub fn dedupe_by_url(mut articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::with_capacity(articles.len());
    articles.retain(|a| seen.insert(a.url.clone()));
    articles
}

pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Case-insensitive title dedup, so syndicated copies of one story collapse.
pub fn dedupe_by_title(mut articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::with_capacity(articles.len());
    articles.retain(|a| seen.insert(title_key(&a.title)));
    articles
}

pub fn dedupe(articles: Vec<Article>, mode: DedupeMode) -> Vec<Article> {
    let articles = dedupe_by_url(articles);
    match mode {
        DedupeMode::UrlOnly => articles,
        DedupeMode::UrlThenTitle => dedupe_by_title(articles),
    }
}
