//! Atom 1.0 parser.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::app::Result;
use crate::domain::feed::DEFAULT_WEBSITE;
use crate::normalizer::xml::{self, push_text};
use crate::normalizer::{ParsedFeed, ParsedItem};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomLink {
    pub rel: String,
    pub mime: String,
    pub href: String,
}

impl AtomLink {
    fn from_element(e: &BytesStart) -> Self {
        Self {
            rel: xml::attribute(e, "rel").unwrap_or_default(),
            mime: xml::attribute(e, "type").unwrap_or_default(),
            href: xml::attribute(e, "href").unwrap_or_default(),
        }
    }

    fn is_alternate(&self) -> bool {
        self.rel.is_empty() || self.rel == "alternate"
    }
}

/// Website for the feed: the `text/html` link, else the first alternate
/// link, else a placeholder.
pub fn website(links: &[AtomLink]) -> String {
    let usable = || links.iter().filter(|l| !l.href.trim().is_empty());
    usable()
        .find(|l| l.mime == "text/html")
        .or_else(|| usable().find(|l| l.is_alternate()))
        .map(|l| l.href.trim().to_string())
        .unwrap_or_else(|| DEFAULT_WEBSITE.to_string())
}

/// Link to show for an entry: an HTML alternate if there is one.
fn web_link(links: &[AtomLink]) -> String {
    links
        .iter()
        .find(|l| l.is_alternate() && (l.mime.is_empty() || l.mime == "text/html"))
        .or_else(|| links.iter().find(|l| l.is_alternate()))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
struct AtomEntry {
    id: String,
    title: String,
    summary: String,
    content: String,
    updated: String,
    published: String,
    links: Vec<AtomLink>,
}

impl AtomEntry {
    fn capture(&mut self, field: &str, text: &str) {
        let buf = match field {
            "id" => &mut self.id,
            "title" => &mut self.title,
            "summary" => &mut self.summary,
            "content" => &mut self.content,
            "updated" => &mut self.updated,
            "published" => &mut self.published,
            _ => return,
        };
        push_text(buf, text);
    }

    fn finish(self) -> ParsedItem {
        let description = if self.summary.is_empty() {
            self.content
        } else {
            self.summary
        };
        let date = if self.updated.is_empty() {
            self.published
        } else {
            self.updated
        };

        ParsedItem {
            link: web_link(&self.links),
            permalink: self.id.clone(),
            id: self.id,
            title: self.title,
            description,
            date,
        }
    }
}

/// Element name with an explicit `atom:` prefix removed; other prefixes are
/// kept so foreign elements never shadow Atom ones.
fn atom_name(raw: &[u8]) -> String {
    let name = xml::element_name(raw);
    match name.strip_prefix("atom:") {
        Some(local) => local.to_string(),
        None => name,
    }
}

/// Parse the body of a `<feed>` element. The reader must be positioned just
/// after the root start tag; parsing stops at the matching end tag.
pub fn parse(reader: &mut Reader<&[u8]>) -> Result<ParsedFeed> {
    let mut feed = ParsedFeed::default();
    let mut links: Vec<AtomLink> = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut entry: Option<AtomEntry> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = atom_name(e.name().as_ref());
                collect_link(&path, &name, &e, &mut links, entry.as_mut());
                path.push(name);
                if path.len() == 1 && path[0] == "entry" {
                    entry = Some(AtomEntry::default());
                }
            }
            Event::Empty(e) => {
                let name = atom_name(e.name().as_ref());
                collect_link(&path, &name, &e, &mut links, entry.as_mut());
            }
            Event::Text(e) => capture(&path, &xml::text(&e), &mut feed, entry.as_mut()),
            Event::CData(e) => capture(&path, &xml::cdata(&e), &mut feed, entry.as_mut()),
            Event::End(_) => {
                if path.len() == 1 && path[0] == "entry" {
                    if let Some(entry) = entry.take() {
                        feed.items.push(entry.finish());
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

    feed.website = website(&links);
    Ok(feed)
}

fn collect_link(
    path: &[String],
    name: &str,
    e: &BytesStart,
    feed_links: &mut Vec<AtomLink>,
    entry: Option<&mut AtomEntry>,
) {
    if name != "link" {
        return;
    }
    match path {
        [] => feed_links.push(AtomLink::from_element(e)),
        [parent] if parent == "entry" => {
            if let Some(entry) = entry {
                entry.links.push(AtomLink::from_element(e));
            }
        }
        _ => {}
    }
}

fn capture(path: &[String], text: &str, feed: &mut ParsedFeed, entry: Option<&mut AtomEntry>) {
    match path {
        [field] if field == "title" => push_text(&mut feed.title, text),
        [field] if field == "subtitle" => push_text(&mut feed.description, text),
        [parent, field, ..] if parent == "entry" => {
            if let Some(entry) = entry {
                entry.capture(field, text);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(xml: &str) -> ParsedFeed {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        loop {
            if let Event::Start(_) = reader.read_event().unwrap() {
                break;
            }
        }
        parse(&mut reader).unwrap()
    }

    fn link(rel: &str, mime: &str, href: &str) -> AtomLink {
        AtomLink {
            rel: rel.into(),
            mime: mime.into(),
            href: href.into(),
        }
    }

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <subtitle>An Atom test feed</subtitle>
  <link rel="self" type="application/atom+xml" href="https://example.com/feed.atom"/>
  <link rel="alternate" type="text/html" href="https://example.com/"/>
  <author><name>Someone</name></author>
  <entry>
    <title>Atom Entry 1</title>
    <link rel="alternate" href="https://example.com/atom1"/>
    <link rel="enclosure" href="https://example.com/atom1.mp3"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2003-12-13T18:30:02Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
  <entry>
    <title type="html">&lt;i&gt;Second&lt;/i&gt;</title>
    <link rel="enclosure" href="https://example.com/atom2.mp3"/>
    <id>tag:example.com,2024:2</id>
    <published>2024-01-01T00:00:00Z</published>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Inline</p><p>markup</p></div></content>
  </entry>
</feed>"#;

    #[test]
    fn test_feed_fields() {
        let feed = parse_str(ATOM_SAMPLE);
        assert_eq!(feed.title, "Atom Test Feed");
        assert_eq!(feed.description, "An Atom test feed");
        assert_eq!(feed.website, "https://example.com/");
    }

    #[test]
    fn test_entries() {
        let feed = parse_str(ATOM_SAMPLE);
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title, "Atom Entry 1");
        assert_eq!(first.link, "https://example.com/atom1");
        assert_eq!(first.id, "urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a");
        assert_eq!(first.permalink, first.id);
        assert_eq!(first.date, "2003-12-13T18:30:02Z");
        assert_eq!(first.description, "This is Atom entry 1");

        let second = &feed.items[1];
        assert_eq!(second.title, "<i>Second</i>");
        assert_eq!(second.link, "https://example.com/atom2.mp3");
        assert_eq!(second.date, "2024-01-01T00:00:00Z");
        assert_eq!(second.description, "Inline markup");
    }

    #[test]
    fn test_website_prefers_html_link() {
        let links = vec![
            link("alternate", "application/json", "A"),
            link("alternate", "text/html", "B"),
        ];
        assert_eq!(website(&links), "B");
    }

    #[test]
    fn test_website_falls_back_to_first_alternate() {
        let links = vec![link("self", "application/atom+xml", "S"), link("", "", "P")];
        assert_eq!(website(&links), "P");
    }

    #[test]
    fn test_website_skips_empty_html_link() {
        let links = vec![link("alternate", "text/html", ""), link("", "application/rss+xml", "P")];
        assert_eq!(website(&links), "P");
    }

    #[test]
    fn test_website_placeholder() {
        assert_eq!(website(&[]), "http://example.com/");
        assert_eq!(website(&[link("self", "", "S")]), "http://example.com/");
    }

    #[test]
    fn test_website_from_document() {
        let feed = parse_str(
            r#"<feed xmlns="http://www.w3.org/2005/Atom">
                <link type="application/json" href="A"/>
                <link type="text/html" href="B"/>
            </feed>"#,
        );
        assert_eq!(feed.website, "B");
    }
}
