//! RSS 0.9x/2.0 parser.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::app::Result;
use crate::normalizer::xml::{self, push_text};
use crate::normalizer::{ParsedFeed, ParsedItem};

#[derive(Debug, Default)]
struct RssItem {
    title: String,
    description: String,
    encoded: String,
    link: String,
    guid: String,
    guid_is_permalink: bool,
    pub_date: String,
    dc_date: String,
}

impl RssItem {
    fn new() -> Self {
        Self {
            guid_is_permalink: true,
            ..Self::default()
        }
    }

    fn capture(&mut self, field: &str, text: &str) {
        let buf = match field {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "content:encoded" => &mut self.encoded,
            "link" => &mut self.link,
            "guid" => &mut self.guid,
            "pubDate" => &mut self.pub_date,
            "dc:date" => &mut self.dc_date,
            _ => return,
        };
        push_text(buf, text);
    }

    fn finish(self) -> ParsedItem {
        let description = if self.description.is_empty() {
            self.encoded
        } else {
            self.description
        };
        let permalink = if self.guid_is_permalink {
            self.guid.clone()
        } else {
            String::new()
        };
        let date = if self.pub_date.is_empty() {
            self.dc_date
        } else {
            self.pub_date
        };

        ParsedItem {
            id: self.guid,
            title: self.title,
            description,
            link: self.link,
            permalink,
            date,
        }
    }
}

/// Where the reader currently sits, relative to `<rss>`.
fn in_item(path: &[String]) -> bool {
    path.len() >= 2 && path[0] == "channel" && path[1] == "item"
}

/// Parse the body of an `<rss>` element. The reader must be positioned just
/// after the root start tag; parsing stops at the matching end tag.
pub fn parse(reader: &mut Reader<&[u8]>) -> Result<ParsedFeed> {
    let mut feed = ParsedFeed::default();
    let mut path: Vec<String> = Vec::new();
    let mut item: Option<RssItem> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = xml::element_name(e.name().as_ref());
                if path.len() == 2 && in_item(&path) && name == "guid" {
                    if let Some(item) = item.as_mut() {
                        item.guid_is_permalink = xml::attribute(&e, "isPermaLink")
                            .map_or(true, |v| !v.trim().eq_ignore_ascii_case("false"));
                    }
                }
                path.push(name);
                if path.len() == 2 && in_item(&path) {
                    item = Some(RssItem::new());
                }
            }
            Event::Text(e) => capture(&path, &xml::text(&e), &mut feed, item.as_mut()),
            Event::CData(e) => capture(&path, &xml::cdata(&e), &mut feed, item.as_mut()),
            Event::End(_) => {
                if path.len() == 2 && in_item(&path) {
                    if let Some(item) = item.take() {
                        feed.items.push(item.finish());
                    }
                }
                if path.pop().is_none() {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(feed)
}

fn capture(path: &[String], text: &str, feed: &mut ParsedFeed, item: Option<&mut RssItem>) {
    if in_item(path) {
        if let (Some(item), Some(field)) = (item, path.get(2)) {
            item.capture(field, text);
        }
        return;
    }

    if path.len() != 2 || path[0] != "channel" {
        return;
    }
    match path[1].as_str() {
        "title" => push_text(&mut feed.title, text),
        "description" => push_text(&mut feed.description, text),
        "link" if feed.website.is_empty() => push_text(&mut feed.website, text),
        _ => {}
    }
}
