use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Feed;
use crate::normalizer::timestamp;

/// JSONP callback wrapped around the published document.
pub const CALLBACK: &str = "onGetRiverStream";
pub const DOCS_URL: &str = "http://riverjs.org";
pub const FORMAT_VERSION: &str = "3";

/// The published river: recently updated feeds, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct River {
    #[serde(rename = "updatedFeeds")]
    pub updated_feeds: UpdatedFeeds,
    pub metadata: RiverMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedFeeds {
    #[serde(rename = "updatedFeed")]
    pub updated_feed: Vec<Feed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverMetadata {
    pub docs: String,
    pub version: String,
    pub secs: String,
    #[serde(rename = "whenGMT")]
    pub when_gmt: String,
    #[serde(rename = "whenLocal")]
    pub when_local: String,
}

impl Default for RiverMetadata {
    fn default() -> Self {
        Self {
            docs: DOCS_URL.to_string(),
            version: FORMAT_VERSION.to_string(),
            secs: String::new(),
            when_gmt: String::new(),
            when_local: String::new(),
        }
    }
}

impl River {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.updated_feeds.updated_feed
    }

    /// Put `feed` at the front and drop the oldest entries beyond `cap`.
    pub fn publish(&mut self, feed: Feed, cap: usize) {
        let feeds = &mut self.updated_feeds.updated_feed;
        feeds.insert(0, feed);
        feeds.truncate(cap);
    }

    /// Refresh the generation timestamps.
    pub fn touch<Tz>(&mut self, now: DateTime<Tz>, elapsed: Duration)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.metadata.when_gmt = timestamp::format_utc(now.with_timezone(&Utc));
        self.metadata.when_local = timestamp::format_local(&now);
        self.metadata.secs = format!("{:.3}", elapsed.as_secs_f64());
    }
}
