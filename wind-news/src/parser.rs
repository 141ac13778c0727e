use crate::sources::display_name_for_source;
use crate::types::{AggregatorError, ParsedFeed, RawFeedItem, Result};
use feed_rs::parser;
use std::collections::HashMap;
use tracing::debug;

/// Stateless wrapper over `feed-rs`. Dedup happens later, across feeds.
#[derive(Debug, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content.trim().to_string()).filter(|t| !t.is_empty());
        let sources = item_sources(content);
        let items: Vec<RawFeedItem> = feed.entries.into_iter().map(|e| Self::parse_entry(e, &sources)).collect();

        debug!("Parsed feed {:?} with {} entries", title, items.len());
        Ok(ParsedFeed { title, items })
    }

    fn parse_entry(entry: feed_rs::model::Entry, sources: &HashMap<String, String>) -> RawFeedItem {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        let description = entry
            .summary
            .map(|s| s.content)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| entry.content.and_then(|c| c.body));

        let source = entry
            .source
            .as_deref()
            .and_then(display_name_for_source)
            .or_else(|| link.as_deref().and_then(|l| sources.get(l.trim())).cloned());

        RawFeedItem {
            title: entry.title.map(|t| t.content),
            link,
            pub_date: entry.published.or(entry.updated),
            description,
            source,
        }
    }
}

/// RSS 2.0 `<source>` per item link. feed-rs drops item sources, so RSS
/// documents get a second pass; anything else yields an empty map.
fn item_sources(content: &str) -> HashMap<String, String> {
    let Ok(channel) = rss::Channel::read_from(content.as_bytes()) else {
        return HashMap::new();
    };
    channel
        .items()
        .iter()
        .filter_map(|item| {
            let link = item.link()?.trim();
            let source = item.source()?;
            let name = source.title().filter(|t| !t.trim().is_empty()).unwrap_or(source.url());
            display_name_for_source(name).map(|name| (link.to_string(), name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"wind farm ireland" - Google News</title>
    <link>https://news.google.com</link>
    <description>Google News</description>
    <item>
      <title>Wind farm approved in Clare - Clare Champion</title>
      <link>https://example.ie/clare-wind-farm</link>
      <pubDate>Mon, 03 Mar 2025 10:15:00 GMT</pubDate>
      <description>&lt;a href="https://example.ie"&gt;Council approves&lt;/a&gt;</description>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.ie/second</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items() {
        let parsed = FeedParser::new().parse_feed(RSS).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("\"wind farm ireland\" - Google News"));
        assert_eq!(parsed.items.len(), 2);

        let first = &parsed.items[0];
        assert_eq!(first.title.as_deref(), Some("Wind farm approved in Clare - Clare Champion"));
        assert_eq!(first.link.as_deref(), Some("https://example.ie/clare-wind-farm"));
        assert_eq!(first.pub_date, Some(Utc.with_ymd_and_hms(2025, 3, 3, 10, 15, 0).unwrap()));
        assert!(first.description.as_deref().unwrap_or_default().contains("Council approves"));

        assert_eq!(parsed.items[1].pub_date, None);
        assert_eq!(parsed.items[1].description, None);
    }

    #[test]
    fn item_source_names_the_publisher() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"offshore wind ireland" - Google News</title>
    <link>https://news.google.com</link>
    <description>Google News</description>
    <item>
      <title>Offshore wind auction results - Business Post</title>
      <link>https://news.google.com/articles/abc</link>
      <source url="https://www.businesspost.ie">Business Post</source>
    </item>
    <item>
      <title>Cork harbour turbines</title>
      <link>https://news.google.com/articles/def</link>
      <source url="https://www.irishexaminer.com"></source>
    </item>
    <item>
      <title>No source here</title>
      <link>https://news.google.com/articles/ghi</link>
    </item>
  </channel>
</rss>"#;
        let parsed = FeedParser::new().parse_feed(xml).unwrap();
        let sources: Vec<_> = parsed.items.iter().map(|i| i.source.as_deref()).collect();
        assert_eq!(sources, vec![Some("Business Post"), Some("Irish Examiner"), None]);
    }

    #[test]
    fn empty_channel_has_no_items() {
        let xml = r#"<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;
        assert!(FeedParser::new().parse_feed(xml).unwrap().items.is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = FeedParser::new().parse_feed("not xml at all").unwrap_err();
        assert!(matches!(err, AggregatorError::Parse(_)));
        assert!(FeedParser::new().parse_feed("<html><body>Service unavailable</body></html>").is_err());
    }
}
