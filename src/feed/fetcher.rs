//! RSS feed fetcher.
//!
//! Performs one HTTP GET per call with the configured timeouts, redirect
//! limit and body size cap, then decodes the body as an RSS 2.0 channel.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::types::{ParsedFeed, ParsedItem};
use crate::config::FetcherConfig;
use crate::error::NetworkError;
use crate::{GatorError, Result};

/// RSS feed fetcher.
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse the feed at `url`.
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        debug!(url, "Fetching feed");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(NetworkError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()).into());
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(NetworkError::BodyTooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                }
                .into());
            }
        }

        // Chunked bodies carry no length, so the cap is checked while reading.
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(NetworkError::from)? {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_feed_size {
                return Err(NetworkError::BodyTooLarge {
                    size,
                    max: self.max_feed_size,
                }
                .into());
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "Feed downloaded");
        parse_feed(&body)
    }
}

/// Parse an RSS 2.0 document.
///
/// Titles and descriptions are HTML-entity-decoded after XML parsing.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let channel = rss::Channel::read_from(bytes)
        .map_err(|e| GatorError::Decode(format!("failed to parse feed: {}", e)))?;

    let items = channel
        .items()
        .iter()
        .map(|item| ParsedItem {
            title: unescape_html(item.title().unwrap_or_default()),
            link: item.link().unwrap_or_default().to_string(),
            description: unescape_html(item.description().unwrap_or_default()),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(ParsedFeed {
        title: unescape_html(channel.title()),
        link: channel.link().to_string(),
        description: unescape_html(channel.description()),
        items,
    })
}

/// Decode HTML character references.
///
/// Uses the full HTML5 entity table, including legacy names written
/// without `;` and the Windows-1252 mapping for `&#x80;`..`&#x9F;`.
/// Unknown names and a bare `&` are kept as written.
pub fn unescape_html(text: &str) -> String {
    htmlize::unescape(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tom &amp;amp; Jerry</title>
    <link>https://example.com</link>
    <description>Cats &amp;amp; mice</description>
    <item>
      <title>First &amp;#39;post&amp;#39;</title>
      <link>https://example.com/1</link>
      <description><![CDATA[It&#39;s &lt;b&gt;bold&lt;/b&gt;]]></description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <link>https://example.com/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_channel() {
        let feed = parse_feed(SAMPLE_RSS.as_bytes()).unwrap();
        assert_eq!(feed.title, "Tom & Jerry");
        assert_eq!(feed.link, "https://example.com");
        assert_eq!(feed.description, "Cats & mice");
        assert_eq!(feed.items.len(), 2);
    }

    #[test]
    fn test_parse_feed_items() {
        let feed = parse_feed(SAMPLE_RSS.as_bytes()).unwrap();

        let first = &feed.items[0];
        assert_eq!(first.title, "First 'post'");
        assert_eq!(first.link, "https://example.com/1");
        assert_eq!(first.description, "It's <b>bold</b>");
        assert_eq!(first.pub_date, "Mon, 02 Jan 2006 15:04:05 -0700");

        let second = &feed.items[1];
        assert_eq!(second.title, "");
        assert_eq!(second.description, "");
        assert_eq!(second.pub_date, "");
    }

    #[test]
    fn test_parse_feed_malformed() {
        let err = parse_feed(b"<rss><channel><title>oops</channel>").unwrap_err();
        assert!(matches!(err, GatorError::Decode(_)));
    }

    #[test]
    fn test_parse_feed_not_rss() {
        let err = parse_feed(b"<html><body>hello</body></html>").unwrap_err();
        assert!(matches!(err, GatorError::Decode(_)));

        let err = parse_feed(b"").unwrap_err();
        assert!(matches!(err, GatorError::Decode(_)));
    }

    #[test]
    fn test_unescape_html_named() {
        assert_eq!(unescape_html("a &amp; b"), "a & b");
        assert_eq!(unescape_html("&lt;p&gt;"), "<p>");
        assert_eq!(unescape_html("&quot;hi&quot;"), "\"hi\"");
        assert_eq!(unescape_html("wait&hellip;"), "wait\u{2026}");
    }

    #[test]
    fn test_unescape_html_numeric() {
        assert_eq!(unescape_html("It&#39;s"), "It's");
        assert_eq!(unescape_html("&#x41;&#X42;"), "AB");
        assert_eq!(unescape_html("&#128512;"), "\u{1f600}");
    }

    #[test]
    fn test_unescape_html_full_table() {
        assert_eq!(unescape_html("&Eacute;cole"), "\u{c9}cole");
        assert_eq!(unescape_html("&hearts;"), "\u{2665}");
        assert_eq!(unescape_html("&rarr; next"), "\u{2192} next");
    }

    #[test]
    fn test_unescape_html_legacy_without_semicolon() {
        assert_eq!(unescape_html("&copy 2024"), "\u{a9} 2024");
        assert_eq!(unescape_html("a &amp b"), "a & b");
    }

    #[test]
    fn test_unescape_html_windows_1252_range() {
        assert_eq!(unescape_html("&#x80;"), "\u{20ac}");
        assert_eq!(unescape_html("&#150;"), "\u{2013}");
    }

    #[test]
    fn test_unescape_html_keeps_unknown() {
        assert_eq!(unescape_html("fish & chips"), "fish & chips");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
        assert_eq!(unescape_html("trailing &"), "trailing &");
    }

    #[test]
    fn test_unescape_html_no_double_decode() {
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_unescape_html_multibyte() {
        assert_eq!(unescape_html("日本&amp;語"), "日本&語");
    }

    #[test]
    fn test_fetcher_new() {
        assert!(FeedFetcher::new(&FetcherConfig::default()).is_ok());
    }
}
