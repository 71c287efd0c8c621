//! Human-friendly durations: "1h", "15m", "30s", "1d" or raw seconds.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};

/// Parse interval string like "1h", "30m", "6h", "1d"
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    let secs = if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600).ok_or_else(|| format!("Invalid hours: {}", hours))?
    } else if let Some(minutes) = s.strip_suffix('m') {
        scaled(minutes, 60).ok_or_else(|| format!("Invalid minutes: {}", minutes))?
    } else if let Some(days) = s.strip_suffix('d') {
        scaled(days, 86400).ok_or_else(|| format!("Invalid days: {}", days))?
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))?
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))?
    };

    Ok(Duration::from_secs(secs))
}

/// `count * unit` seconds, or `None` when unparsable or out of range.
fn scaled(count: &str, unit: u64) -> Option<u64> {
    count.parse::<u64>().ok()?.checked_mul(unit)
}

/// Shortest and longest period a timer runs with.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 86400);

/// Bring a configured period into the range timers accept.
pub fn clamp_period(period: Duration) -> Duration {
    period.clamp(MIN_PERIOD, MAX_PERIOD)
}

/// Format interval for display
pub fn format_interval(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// `deserialize_with` helper accepting either an interval string or seconds.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct IntervalVisitor;

    impl Visitor<'_> for IntervalVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an interval like \"1h\" or a number of seconds")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Duration, E> {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative interval: {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Duration, E> {
            parse_interval(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(IntervalVisitor)
}
