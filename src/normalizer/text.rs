//! Plain-text cleanup for item titles and bodies.

use html_escape::decode_html_entities;

pub const ELLIPSIS: char = '\u{2026}';

/// Strip markup, trim, and fit into `budget` characters.
pub fn clean(text: &str, budget: usize) -> String {
    truncate(&strip_html(text), budget)
}

/// Remove tags, decode entities and collapse runs of whitespace. A `<` not
/// followed by a letter, `/`, `!` or `?` is plain text.
pub fn strip_html(html: &str) -> String {
    let mut stripped = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '<' if !in_tag && chars.peek().is_some_and(|&next| opens_tag(next)) => {
                in_tag = true;
                // Tags separate words ("a<br>b" reads as "a b").
                stripped.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    collapse_whitespace(&decode_html_entities(&stripped))
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result.trim().to_string()
}

/// Cut `text` to at most `budget` characters on a word boundary.
///
/// Text over budget is cut at the last whitespace before the boundary, loses
/// a trailing period or comma, and gets a single ellipsis appended.
pub fn truncate(text: &str, budget: usize) -> String {
    // The ellipsis alone takes one character.
    let budget = budget.max(1);
    let text = text.trim();
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= budget {
        return text.to_string();
    }

    let limit = budget.saturating_sub(1);
    let cut = (1..=limit)
        .rev()
        .find(|&i| chars[i].is_whitespace())
        .unwrap_or(limit);

    let mut head: String = chars[..cut].iter().collect();
    head.truncate(head.trim_end().len());
    if head.ends_with('.') || head.ends_with(',') {
        head.pop();
    }
    head.push(ELLIPSIS);
    head
}
