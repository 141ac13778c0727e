use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;

use crate::classify::{classify_category, classify_province, classify_tags};
use crate::types::{Article, FeedContext, ImagePolicy, RawFeedItem};

pub const DESCRIPTION_LIMIT: usize = 200;
const ELLIPSIS: &str = "...";

const PLACEHOLDER_OFFSHORE: &str = "https://images.unsplash.com/photo-1532601224476-15c79f2f7a51?w=800&q=80";
const PLACEHOLDER_ONSHORE: &str = "https://images.unsplash.com/photo-1466611653911-95081537e5b7?w=800&q=80";
const PLACEHOLDER_PLANNING: &str = "https://images.unsplash.com/photo-1454165804606-c3d57bc86b40?w=800&q=80";
const PLACEHOLDER_CONSTRUCTION: &str = "https://images.unsplash.com/photo-1503387762-592deb58ef4e?w=800&q=80";
const PLACEHOLDER_DEFAULT: &str = "https://images.unsplash.com/photo-1473341304170-971dccb5ac1e?w=800&q=80";

const PLACEHOLDERS: [&str; 5] = [
    PLACEHOLDER_OFFSHORE,
    PLACEHOLDER_ONSHORE,
    PLACEHOLDER_PLANNING,
    PLACEHOLDER_CONSTRUCTION,
    PLACEHOLDER_DEFAULT,
];

const UNWANTED_IMAGE_PATTERNS: &[&str] = &[
    "logo", "icon", "avatar", "pixel", "tracking", "button", "badge", "banner", "ad.", "ads.",
    "spacer", "blank", "1x1", "placeholder", "social", "share", "facebook", "twitter", "linkedin",
];

const STRICT_IMAGE_PATTERNS: &[&str] = &["gravatar", "emoji", "gif", "gstatic", "ggpht", "googleusercontent"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("item has no title")]
    MissingTitle,

    #[error("item '{title}' has no link")]
    MissingLink { title: String },
}

/// Remove markup, decode the common entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let text = html
        .chars()
        .fold((String::with_capacity(html.len()), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => {
                // Keep words on either side of a tag apart.
                text.push(' ');
                (text, false)
            }
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0;

    decode_entities(&text).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    // &amp; goes last so "&amp;lt;" stays as the literal "&lt;".
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&#8217;", "\u{2019}")
        .replace("&#8216;", "\u{2018}")
        .replace("&#8211;", "\u{2013}")
        .replace("&amp;", "&")
}

/// Cut to `limit` characters and mark the cut. The marker is always added.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn is_unwanted_image(url: &str) -> bool {
    let lower = url.trim().to_lowercase();
    lower.is_empty() || lower.starts_with("data:") || UNWANTED_IMAGE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Adds hosts and formats that rarely carry a usable article photo.
pub fn is_unwanted_image_strict(url: &str) -> bool {
    is_unwanted_image(url) || {
        let lower = url.to_lowercase();
        STRICT_IMAGE_PATTERNS.iter().any(|p| lower.contains(p))
    }
}

pub fn is_unwanted_image_with(policy: ImagePolicy, url: &str) -> bool {
    match policy {
        ImagePolicy::Standard => is_unwanted_image(url),
        ImagePolicy::Strict => is_unwanted_image_strict(url),
    }
}

/// First `<img src>` in an HTML fragment, if it passes the policy.
pub fn extract_inline_image(html: &str, policy: ImagePolicy) -> Option<String> {
    if !html.contains("<img") && !html.contains("<IMG") {
        return None;
    }
    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);
    let src = fragment.select(&selector).next()?.value().attr("src")?.trim().to_string();
    if is_unwanted_image_with(policy, &src) {
        debug!("Ignoring inline image {}", src);
        return None;
    }
    Some(src)
}

pub fn placeholder_image(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if lower.contains("offshore") {
        PLACEHOLDER_OFFSHORE
    } else if lower.contains("onshore") {
        PLACEHOLDER_ONSHORE
    } else if lower.contains("planning") || lower.contains("approval") {
        PLACEHOLDER_PLANNING
    } else if lower.contains("construction") || lower.contains("building") {
        PLACEHOLDER_CONSTRUCTION
    } else {
        PLACEHOLDER_DEFAULT
    }
}

pub fn is_placeholder_image(url: &str) -> bool {
    PLACEHOLDERS.contains(&url)
}

/// Placeholder or missing: both mean nobody found a real picture yet.
pub fn needs_real_image(image: Option<&str>) -> bool {
    image.map_or(true, is_placeholder_image)
}

/// Title plus markup-free description, before truncation. Classifiers and
/// the relevance filter both read this.
pub fn classification_text(raw: &RawFeedItem) -> String {
    format!(
        "{} {}",
        strip_html(raw.title.as_deref().unwrap_or_default()),
        strip_html(raw.description.as_deref().unwrap_or_default())
    )
}

/// Turn one raw feed item into an [`Article`]. Only the title and link are
/// mandatory; everything else has a default.
pub fn normalize(
    raw: RawFeedItem,
    ctx: &FeedContext,
    fetched_at: DateTime<Utc>,
    policy: ImagePolicy,
) -> Result<Article, NormalizeError> {
    let text = classification_text(&raw);
    let title = raw
        .title
        .map(|t| strip_html(&t))
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingTitle)?;

    let url = match raw.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
        Some(url) => url,
        None => return Err(NormalizeError::MissingLink { title }),
    };

    let raw_description = raw.description.unwrap_or_default();
    let plain = strip_html(&raw_description);

    let image = extract_inline_image(&raw_description, policy)
        .unwrap_or_else(|| placeholder_image(&text).to_string());

    let source = raw
        .source
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ctx.default_source.clone());

    Ok(Article {
        description: truncate_description(&plain, DESCRIPTION_LIMIT),
        source,
        date: raw.pub_date.unwrap_or(fetched_at),
        url,
        image: Some(image),
        tags: classify_tags(&text),
        category: classify_category(&text),
        province: classify_province(&text),
        ai_categories: None,
        title,
    })
}
