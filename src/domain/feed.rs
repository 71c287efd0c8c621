use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::FeedItem;
use crate::normalizer::timestamp;

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_WEBSITE: &str = "http://example.com/";

/// Snapshot of one polled source, as published in the river.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "feedUrl")]
    pub url: String,
    #[serde(rename = "websiteUrl")]
    pub website: String,
    #[serde(rename = "feedTitle")]
    pub title: String,
    #[serde(rename = "feedDescription")]
    pub description: String,
    #[serde(rename = "whenLastUpdate")]
    pub last_update: String,
    #[serde(rename = "item")]
    pub items: Vec<FeedItem>,
}

impl Feed {
    pub fn new(url: impl Into<String>) -> Self {
        Self::stamped(url, Utc::now())
    }

    pub fn stamped(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            website: DEFAULT_WEBSITE.to_string(),
            title: UNTITLED.to_string(),
            description: String::new(),
            last_update: timestamp::format_utc(now),
            items: Vec::new(),
        }
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }
}
