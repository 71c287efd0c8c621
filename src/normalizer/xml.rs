//! Small helpers over quick-xml events shared by the format parsers.

use html_escape::decode_html_entities;
use quick_xml::events::{BytesCData, BytesStart, BytesText};

/// Qualified element name, prefix included ("content:encoded").
pub fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Value of the attribute whose local name is `key`.
pub fn attribute(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .map(|attr| decode_html_entities(&String::from_utf8_lossy(&attr.value)).into_owned())
}

pub fn text(e: &BytesText) -> String {
    decode_html_entities(&String::from_utf8_lossy(e)).into_owned()
}

pub fn cdata(e: &BytesCData) -> String {
    String::from_utf8_lossy(e).into_owned()
}

/// Append a text segment, keeping segments apart.
pub fn push_text(buf: &mut String, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if !buf.is_empty() {
        buf.push(' ');
    }
    buf.push_str(segment);
}
