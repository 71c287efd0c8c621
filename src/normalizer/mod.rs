pub mod atom;
pub mod decode;
pub mod rss;
pub mod text;
pub mod timestamp;
mod xml;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::app::Result;
use crate::domain::feed::UNTITLED;
use crate::domain::{item, Feed, FeedItem};
use crate::store::History;

pub use decode::{CharsetDecoder, DocumentDecoder};

/// The wire formats we understand, keyed by root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    /// Pick the format from the root element's local name.
    pub fn from_root(name: &[u8]) -> Option<Self> {
        let local = match name.iter().position(|b| *b == b':') {
            Some(i) => &name[i + 1..],
            None => name,
        };
        match local {
            b"rss" => Some(Self::Rss),
            b"feed" => Some(Self::Atom),
            _ => None,
        }
    }

    fn parse(self, reader: &mut Reader<&[u8]>) -> Result<ParsedFeed> {
        match self {
            Self::Rss => rss::parse(reader),
            Self::Atom => atom::parse(reader),
        }
    }
}

/// Feed header and entries as read off the wire, before cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub website: String,
    pub description: String,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    /// guid / id as given by the feed, possibly empty
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub permalink: String,
    pub date: String,
}

impl ParsedItem {
    pub fn guid(&self) -> String {
        item::guid(&self.id, &self.title, &self.link)
    }

    /// Title and body to display. A lone description is promoted to the
    /// title slot.
    pub fn display_pair(&self) -> (&str, &str) {
        let title = self.title.trim();
        let description = self.description.trim();
        match (title.is_empty(), description.is_empty()) {
            (false, false) => (title, description),
            (true, false) => (description, ""),
            (false, true) => (title, ""),
            (true, true) => ("", ""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_items: usize,
    pub character_count: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_items: 5,
            character_count: 280,
        }
    }
}

/// Turns fetched documents into river feeds holding only unseen items.
#[derive(Clone)]
pub struct Normalizer {
    limits: IngestLimits,
    decoder: Arc<dyn DocumentDecoder + Send + Sync>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(IngestLimits::default())
    }
}

impl Normalizer {
    pub fn new(limits: IngestLimits) -> Self {
        Self::with_decoder(limits, Arc::new(CharsetDecoder))
    }

    pub fn with_decoder(
        limits: IngestLimits,
        decoder: Arc<dyn DocumentDecoder + Send + Sync>,
    ) -> Self {
        Self { limits, decoder }
    }

    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    /// Parse a document. `Ok(None)` means the root element is not a feed.
    pub fn parse(&self, body: &[u8]) -> Result<Option<ParsedFeed>> {
        let text = self.decoder.decode(body);
        let mut reader = Reader::from_str(&text);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    return match FeedFormat::from_root(e.name().as_ref()) {
                        Some(format) => format.parse(&mut reader).map(Some),
                        None => {
                            tracing::debug!(
                                "Unrecognised document root <{}>",
                                String::from_utf8_lossy(e.name().as_ref())
                            );
                            Ok(None)
                        }
                    };
                }
                Event::Empty(e) => {
                    return Ok(FeedFormat::from_root(e.name().as_ref()).map(|_| ParsedFeed::default()));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    pub fn normalize(&self, url: &str, body: &[u8], history: &mut dyn History) -> Result<Feed> {
        self.normalize_at(url, body, history, Utc::now())
    }

    /// Build the feed for one fetch of `url`.
    ///
    /// Items are taken in document order until the per-fetch cap is hit or an
    /// already recorded item shows up; feeds list newest first, so everything
    /// after a known item is known too. Taken items are recorded in `history`.
    pub fn normalize_at(
        &self,
        url: &str,
        body: &[u8],
        history: &mut dyn History,
        now: DateTime<Utc>,
    ) -> Result<Feed> {
        let mut feed = Feed::stamped(url, now);

        let Some(parsed) = self.parse(body)? else {
            return Ok(feed);
        };

        feed.title = parsed.title.trim().to_string();
        feed.description = parsed.description.trim().to_string();
        if !parsed.website.trim().is_empty() {
            feed.website = parsed.website.trim().to_string();
        }

        let budget = self.limits.character_count;
        for parsed_item in &parsed.items {
            if feed.items.len() >= self.limits.max_items {
                break;
            }

            let key = parsed_item.guid();
            if history.seen(&key) {
                break;
            }
            history.record(key);

            let (title, body) = parsed_item.display_pair();
            feed.items.push(FeedItem {
                body: text::clean(body, budget),
                permalink: parsed_item.permalink.trim().to_string(),
                pub_date: timestamp::normalize_at(&parsed_item.date, now),
                title: text::clean(title, budget),
                link: parsed_item.link.trim().to_string(),
                id: FeedItem::new_id(),
            });
        }

        if feed.title.is_empty() {
            feed.title = UNTITLED.to_string();
        }

        Ok(feed)
    }
}
