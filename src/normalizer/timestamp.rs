//! Timestamp normalization.
//!
//! Feeds use a zoo of date formats. Everything is rendered back out in one
//! canonical UTC form, `Mon, 02 Jan 2006 15:04:05 GMT`.

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

pub const UTC_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
pub const LOCAL_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Naive layouts tried after the zone-aware ones; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
];

pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format(UTC_FORMAT).to_string()
}

pub fn format_local<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.format(LOCAL_FORMAT).to_string()
}

/// Parse a feed-supplied date, trying each known layout in turn. A weekday
/// that disagrees with the date is ignored.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_layouts(raw).or_else(|| strip_weekday(raw).and_then(parse_layouts))
}

fn parse_layouts(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Some(dt) = parse_naive(raw) {
        return Some(dt);
    }

    // RFC 1123 with a zone abbreviation chrono doesn't know ("CEST", "UTC"):
    // read the wall clock as UTC.
    let (head, zone) = raw.rsplit_once(' ')?;
    if zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return parse_naive(head.trim_end());
    }

    None
}

/// `raw` without a leading `"Ddd, "`.
fn strip_weekday(raw: &str) -> Option<&str> {
    let (day, rest) = raw.split_once(',')?;
    if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn parse_naive(raw: &str) -> Option<DateTime<Utc>> {
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Canonical form of `raw`, or of `now` when `raw` cannot be parsed.
pub fn normalize_at(raw: &str, now: DateTime<Utc>) -> String {
    format_utc(parse(raw).unwrap_or(now))
}

pub fn normalize(raw: &str) -> String {
    normalize_at(raw, Utc::now())
}
