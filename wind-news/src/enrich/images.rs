use crate::normalize::{is_unwanted_image_with, needs_real_image};
use crate::types::{Article, EnrichmentConfig, ImagePolicy};
use crate::Fetcher;
use futures::future::join_all;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const META_SELECTORS: &[&str] = &[
    r#"meta[property="og:image"]"#,
    r#"meta[name="og:image"]"#,
    r#"meta[property="og:image:url"]"#,
    r#"meta[name="twitter:image"]"#,
    r#"meta[property="twitter:image"]"#,
    r#"meta[name="twitter:image:src"]"#,
];

const HERO_SELECTORS: &[&str] = &[
    r#"img[class*="hero"]"#,
    r#"img[class*="featured"]"#,
    r#"img[class*="wp-post-image"]"#,
    r#"[class*="hero"] img"#,
    r#"[id*="hero"] img"#,
    r#"[class*="featured"] img"#,
    r#"[id*="featured"] img"#,
    r#"article figure img"#,
];

/// Per-article result of an image lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    Found(String),
    NotFound,
    Failed(String),
}

fn resolve(page_url: Option<&Url>, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    match Url::parse(src) {
        Ok(url) => Some(url.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => page_url?.join(src).ok().map(|u| u.to_string()),
        Err(_) => None,
    }
}

fn img_src(element: &scraper::ElementRef<'_>) -> Option<String> {
    let attrs = element.value();
    attrs
        .attr("src")
        .filter(|s| !s.trim().is_empty() && !s.starts_with("data:"))
        .or_else(|| attrs.attr("data-src"))
        .or_else(|| attrs.attr("data-lazy-src"))
        .map(str::to_string)
}

fn wide_enough(element: &scraper::ElementRef<'_>, min_width: u32) -> bool {
    match element.value().attr("width").and_then(|w| w.trim().trim_end_matches("px").parse::<u32>().ok()) {
        Some(width) => width >= min_width,
        // No declared width: give it the benefit of the doubt.
        None => true,
    }
}

/// Best article image in a page: open-graph meta, twitter-card meta, a hero
/// or featured image, then the first wide image that isn't chrome.
pub fn extract_page_image(html: &str, page_url: &str, policy: ImagePolicy, min_width: u32) -> Option<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let acceptable = |candidate: Option<String>| {
        candidate
            .and_then(|src| resolve(base.as_ref(), &src))
            .filter(|src| !is_unwanted_image_with(policy, src))
    };

    for raw in META_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else { continue };
        for element in document.select(&selector) {
            if let Some(found) = acceptable(element.value().attr("content").map(str::to_string)) {
                return Some(found);
            }
        }
    }

    for raw in HERO_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else { continue };
        for element in document.select(&selector) {
            if let Some(found) = acceptable(img_src(&element)) {
                return Some(found);
            }
        }
    }

    let images = Selector::parse("img").ok()?;
    document
        .select(&images)
        .filter(|element| wide_enough(element, min_width))
        .find_map(|element| acceptable(img_src(&element)))
}

/// Replaces placeholder images with the article's own picture.
pub struct ImageEnricher {
    fetcher: Arc<Fetcher>,
    config: EnrichmentConfig,
    policy: ImagePolicy,
}

impl ImageEnricher {
    pub fn new(fetcher: Arc<Fetcher>, config: EnrichmentConfig, policy: ImagePolicy) -> Self {
        Self { fetcher, config, policy }
    }

    pub async fn lookup(&self, page_url: &str) -> EnrichOutcome {
        match self.fetcher.fetch_page(page_url).await {
            Ok(html) => match extract_page_image(&html, page_url, self.policy, self.config.min_image_width) {
                Some(image) => EnrichOutcome::Found(image),
                None => EnrichOutcome::NotFound,
            },
            Err(e) => EnrichOutcome::Failed(e.to_string()),
        }
    }

    /// Returns (attempted, found). Articles are visited in slice order, so
    /// pass them newest first.
    pub async fn enrich(&self, articles: &mut [Article]) -> (usize, usize) {
        let pending: Vec<usize> = articles
            .iter()
            .enumerate()
            .filter(|(_, a)| needs_real_image(a.image.as_deref()))
            .map(|(i, _)| i)
            .take(self.config.image_limit)
            .collect();
        if pending.is_empty() {
            return (0, 0);
        }

        let batch_size = self.config.image_batch_size.max(1);
        let mut found = 0;
        for (batch_number, batch) in pending.chunks(batch_size).enumerate() {
            if batch_number > 0 && !self.config.image_batch_delay.is_zero() {
                tokio::time::sleep(self.config.image_batch_delay).await;
            }

            let lookups = batch.iter().map(|&i| {
                let url = articles[i].url.clone();
                async move { (i, self.lookup(&url).await) }
            });
            for (i, outcome) in join_all(lookups).await {
                match outcome {
                    EnrichOutcome::Found(image) => {
                        debug!("Found image for {}: {}", articles[i].url, image);
                        articles[i].image = Some(image);
                        found += 1;
                    }
                    EnrichOutcome::NotFound => debug!("No usable image on {}", articles[i].url),
                    EnrichOutcome::Failed(reason) => debug!("Image lookup failed for {}: {}", articles[i].url, reason),
                }
            }
        }

        info!("Image enrichment: {}/{} articles got a real image", found, pending.len());
        (pending.len(), found)
    }
}
