//! Charset handling for fetched documents.
//!
//! The parsers only ever see UTF-8. Bodies in other encodings are transcoded
//! up front, using the byte-order mark or the XML declaration to pick the
//! source encoding.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

/// Turns raw response bytes into XML text.
pub trait DocumentDecoder {
    fn decode<'a>(&self, body: &'a [u8]) -> Cow<'a, str>;
}

/// Decoder driven by BOM and `<?xml ... encoding="..."?>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharsetDecoder;

impl DocumentDecoder for CharsetDecoder {
    fn decode<'a>(&self, body: &'a [u8]) -> Cow<'a, str> {
        if let Some((encoding, bom_len)) = Encoding::for_bom(body) {
            let (text, _) = encoding.decode_without_bom_handling(&body[bom_len..]);
            return text;
        }

        let encoding = declared_encoding(body).unwrap_or(UTF_8);
        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            tracing::debug!("Replaced malformed {} sequences in document", encoding.name());
        }
        text
    }
}

/// Encoding named by the XML declaration, if any and if usable.
fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start();

    if !head.starts_with("<?xml") {
        return None;
    }
    let declaration = &head[..head.find("?>")?];
    let rest = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    let label = &rest[..rest.find(quote)?];

    // The declaration itself was readable as ASCII, so UTF-16/32 labels
    // can't be right.
    Encoding::for_label(label.trim().as_bytes()).filter(|e| e.is_ascii_compatible())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passthrough() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss>café</rss>".as_bytes();
        assert_eq!(CharsetDecoder.decode(body), "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss>café</rss>");
    }

    #[test]
    fn test_latin1_declaration() {
        let mut body = b"<?xml version='1.0' encoding='ISO-8859-1'?><rss>caf".to_vec();
        body.push(0xE9);
        body.extend_from_slice(b"</rss>");

        let text = CharsetDecoder.decode(&body);
        assert!(text.ends_with("<rss>café</rss>"));
    }

    #[test]
    fn test_bom_wins() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("<feed>ü</feed>".as_bytes());
        assert_eq!(CharsetDecoder.decode(&body), "<feed>ü</feed>");
    }

    #[test]
    fn test_unknown_label_defaults_to_utf8() {
        let body = "<?xml version=\"1.0\" encoding=\"x-made-up\"?><rss>ok</rss>".as_bytes();
        assert!(CharsetDecoder.decode(body).ends_with("<rss>ok</rss>"));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let body = b"<rss>bad \xFF byte</rss>";
        assert_eq!(CharsetDecoder.decode(body), "<rss>bad \u{FFFD} byte</rss>");
    }

    #[test]
    fn test_declared_encoding() {
        assert_eq!(
            declared_encoding(b"<?xml version=\"1.0\" encoding = \"windows-1251\" ?>"),
            Some(encoding_rs::WINDOWS_1251)
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(declared_encoding(b"<rss/>"), None);
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\" encoding=\"UTF-16\"?>"), None);
    }
}
