//! The external list of feeds to poll.
//!
//! The list lives in a local file or at an http(s) URL and comes in one of
//! three shapes: OPML, a YAML sequence of URLs, or plain text with one URL
//! per line.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::app::{Result, RiverError};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::{CharsetDecoder, DocumentDecoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Opml,
    Yaml,
    Text,
}

impl ListFormat {
    /// Guess the format from a file name or URL path.
    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("opml") | Some("xml") => Self::Opml,
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedListSource {
    Local(PathBuf),
    Remote(Url),
}

impl fmt::Display for FeedListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl FeedListSource {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.starts_with("http://") || input.starts_with("https://") {
            Ok(Self::Remote(Url::parse(input)?))
        } else {
            Ok(Self::Local(PathBuf::from(input)))
        }
    }

    pub fn format(&self) -> ListFormat {
        match self {
            Self::Local(path) => ListFormat::from_path(&path.to_string_lossy()),
            Self::Remote(url) => ListFormat::from_path(url.path()),
        }
    }

    /// Load the list. Remote lists go through `fetcher`.
    pub async fn load(&self, fetcher: &(dyn Fetcher + Send + Sync)) -> Result<Vec<String>> {
        let body = match self {
            Self::Local(path) => tokio::fs::read(path).await.map_err(|e| {
                RiverError::FeedList(format!("couldn't read {}: {}", path.display(), e))
            })?,
            Self::Remote(url) => match fetcher.fetch(url.as_str()).await? {
                FetchResult::Content { body } => body,
                FetchResult::NotFound => {
                    return Err(RiverError::FeedList(format!("{} returned 404", url)))
                }
            },
        };

        parse_list(self.format(), &body)
    }
}

/// Parse a feed list, dropping duplicates but keeping first-seen order.
pub fn parse_list(format: ListFormat, body: &[u8]) -> Result<Vec<String>> {
    let urls = match format {
        ListFormat::Opml => parse_opml(&CharsetDecoder.decode(body))?,
        ListFormat::Yaml => parse_yaml(&String::from_utf8_lossy(body))?,
        ListFormat::Text => {
            let content = String::from_utf8_lossy(body);
            parse_yaml(&content).unwrap_or_else(|_| parse_lines(&content))
        }
    };

    let mut seen = HashSet::new();
    Ok(urls
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty() && seen.insert(url.clone()))
        .collect())
}

/// Every `<outline xmlUrl="...">`, at any nesting depth.
fn parse_opml(content: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| RiverError::FeedList(format!("invalid OPML: {}", e)))?;
        match event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.local_name();
                if !saw_root {
                    if name.as_ref() != b"opml" {
                        return Err(RiverError::FeedList("document is not OPML".into()));
                    }
                    saw_root = true;
                }
                if name.as_ref() == b"outline" {
                    if let Some(url) = outline_url(&e) {
                        urls.push(url);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(RiverError::FeedList("document is not OPML".into()));
    }
    Ok(urls)
}

fn outline_url(e: &quick_xml::events::BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"xmlUrl")
        .map(|attr| html_escape::decode_html_entities(&String::from_utf8_lossy(&attr.value)).into_owned())
        .filter(|url| !url.trim().is_empty())
}

fn parse_yaml(content: &str) -> Result<Vec<String>> {
    serde_yaml::from_str::<Vec<String>>(content)
        .map_err(|e| RiverError::FeedList(format!("invalid YAML list: {}", e)))
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;
    use std::io::Write;

    const OPML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Subscriptions</title></head>
  <body>
    <outline text="Tech">
      <outline text="A" type="rss" xmlUrl="https://a.example.com/feed"/>
      <outline text="B" type="rss" xmlUrl="https://b.example.com/feed?x=1&amp;y=2"/>
    </outline>
    <outline text="No URL"/>
    <outline text="A again" xmlUrl="https://a.example.com/feed"></outline>
  </body>
</opml>"#;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ListFormat::from_path("feeds.opml"), ListFormat::Opml);
        assert_eq!(ListFormat::from_path("/x/feeds.OPML"), ListFormat::Opml);
        assert_eq!(ListFormat::from_path("feeds.yaml"), ListFormat::Yaml);
        assert_eq!(ListFormat::from_path("feeds.yml"), ListFormat::Yaml);
        assert_eq!(ListFormat::from_path("feeds.txt"), ListFormat::Text);
        assert_eq!(ListFormat::from_path("feeds"), ListFormat::Text);
    }

    #[test]
    fn test_source_parse() {
        assert!(matches!(
            FeedListSource::parse("https://example.com/feeds.opml").unwrap(),
            FeedListSource::Remote(_)
        ));
        assert_eq!(
            FeedListSource::parse("feeds.txt").unwrap(),
            FeedListSource::Local(PathBuf::from("feeds.txt"))
        );
        assert!(FeedListSource::parse("http://").is_err());
    }

    #[test]
    fn test_parse_opml() {
        let urls = parse_list(ListFormat::Opml, OPML.as_bytes()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://a.example.com/feed".to_string(),
                "https://b.example.com/feed?x=1&y=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_opml_rejects_other_documents() {
        assert!(parse_list(ListFormat::Opml, b"<rss><channel/></rss>").is_err());
        assert!(parse_list(ListFormat::Opml, b"").is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let content = "# feeds\n- https://a.example.com/feed\n- https://b.example.com/feed\n";
        let urls = parse_list(ListFormat::Yaml, content.as_bytes()).unwrap();
        assert_eq!(urls, vec!["https://a.example.com/feed", "https://b.example.com/feed"]);
    }

    #[test]
    fn test_parse_yaml_rejects_mapping() {
        assert!(parse_list(ListFormat::Yaml, b"feeds: 1").is_err());
    }

    #[test]
    fn test_parse_text_lines() {
        let content = "https://a.example.com/feed\n\n# disabled\n  https://b.example.com/feed  \nhttps://a.example.com/feed\n";
        let urls = parse_list(ListFormat::Text, content.as_bytes()).unwrap();
        assert_eq!(urls, vec!["https://a.example.com/feed", "https://b.example.com/feed"]);
    }

    #[test]
    fn test_parse_text_accepts_yaml() {
        let urls = parse_list(ListFormat::Text, b"- https://a.example.com/feed\n").unwrap();
        assert_eq!(urls, vec!["https://a.example.com/feed"]);
    }

    #[test]
    fn test_load_local_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "https://a.example.com/feed").unwrap();
        writeln!(file, "https://b.example.com/feed").unwrap();

        let source = FeedListSource::Local(file.path().to_path_buf());
        let fetcher = StaticFetcher::new();
        let urls = tokio_test::block_on(source.load(&fetcher)).unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(fetcher.total.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_missing_local_file() {
        let source = FeedListSource::Local(PathBuf::from("/nonexistent/feeds.txt"));
        let fetcher = StaticFetcher::new();
        let result = tokio_test::block_on(source.load(&fetcher));
        assert!(matches!(result, Err(RiverError::FeedList(_))));
    }

    #[tokio::test]
    async fn test_load_remote_opml() {
        let fetcher = StaticFetcher::new().with("https://lists.example.com/feeds.opml", OPML);
        let source = FeedListSource::parse("https://lists.example.com/feeds.opml").unwrap();

        let urls = source.load(&fetcher).await.unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_load_remote_not_found() {
        let fetcher = StaticFetcher::new();
        let source = FeedListSource::parse("https://lists.example.com/feeds.yaml").unwrap();
        assert!(matches!(source.load(&fetcher).await, Err(RiverError::FeedList(_))));
    }
}
