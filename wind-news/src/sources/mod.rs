pub mod rss_feed;

pub use rss_feed::RssFeedSource;

use crate::types::FeedContext;
use url::Url;

pub const GOOGLE_NEWS: &str = "Google News";

const GOOGLE_NEWS_QUERIES: &[&str] = &[
    "wind+farm+ireland",
    "wind+energy+ireland",
    "offshore+wind+ireland",
    "onshore+wind+ireland",
    "renewable+energy+ireland",
];

/// Known Irish outlets: registrable domain and display name.
const LOCAL_OUTLETS: &[(&str, &str)] = &[
    ("rte.ie", "RTÉ"),
    ("irishexaminer.com", "Irish Examiner"),
    ("irishtimes.com", "The Irish Times"),
    ("independent.ie", "Irish Independent"),
    ("thejournal.ie", "TheJournal.ie"),
    ("breakingnews.ie", "BreakingNews.ie"),
    ("siliconrepublic.com", "Silicon Republic"),
    ("clarechampion.ie", "Clare Champion"),
    ("limerickleader.ie", "Limerick Leader"),
    ("kildarenow.com", "Kildare Now"),
    ("donegaldaily.com", "Donegal Daily"),
    ("westernpeople.ie", "Western People"),
    ("connachttribune.ie", "Connacht Tribune"),
    ("kilkennypeople.ie", "Kilkenny People"),
    ("corkbeo.ie", "Cork Beo"),
];

/// General-news feeds from local outlets. Their items go through the
/// energy-relevance filter.
const LOCAL_FEEDS: &[&str] = &[
    "https://www.rte.ie/feeds/rss/?index=/news/",
    "https://www.thejournal.ie/feed/",
    "https://www.breakingnews.ie/rss/ireland.rss",
    "https://www.siliconrepublic.com/feed",
    "https://www.clarechampion.ie/feed/",
    "https://www.donegaldaily.com/feed/",
];

pub fn google_news_feed(query: &str) -> String {
    format!("https://news.google.com/rss/search?q={}&hl=en-IE&gl=IE&ceid=IE:en", query)
}

/// The feed list used when nothing else is configured, search feeds first.
pub fn default_feed_urls() -> Vec<String> {
    GOOGLE_NEWS_QUERIES
        .iter()
        .map(|q| google_news_feed(q))
        .chain(LOCAL_FEEDS.iter().map(|u| u.to_string()))
        .collect()
}

fn host_of(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

fn outlet_for_host(host: &str) -> Option<&'static str> {
    LOCAL_OUTLETS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
        .map(|(_, name)| *name)
}

pub fn local_outlet_name(url_str: &str) -> Option<&'static str> {
    host_of(url_str).and_then(|host| outlet_for_host(&host))
}

/// Resolve the defaults a feed's items inherit. Known local outlets get
/// their table name; everything else the channel title or "Google News".
pub fn feed_context(feed_url: &str, channel_title: Option<&str>) -> FeedContext {
    match local_outlet_name(feed_url) {
        Some(name) => FeedContext {
            feed_url: feed_url.to_string(),
            default_source: name.to_string(),
            is_local_source: true,
        },
        None => FeedContext {
            feed_url: feed_url.to_string(),
            default_source: channel_title
                .map(str::trim)
                .filter(|t| !t.is_empty() && !t.contains(GOOGLE_NEWS))
                .unwrap_or(GOOGLE_NEWS)
                .to_string(),
            is_local_source: false,
        },
    }
}

/// Item-level `<source>` may be a publisher name or a publisher URL.
/// URLs become the outlet's table name, or a capitalised host label.
pub fn display_name_for_source(source: &str) -> Option<String> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        return Some(source.to_string());
    }
    let host = host_of(source)?;
    if let Some(name) = outlet_for_host(&host) {
        return Some(name.to_string());
    }
    let label = host.split('.').next().filter(|l| !l.is_empty())?;
    let mut chars = label.chars();
    chars.next().map(|first| first.to_uppercase().chain(chars).collect())
}
