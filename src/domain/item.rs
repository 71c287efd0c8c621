use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One syndicated entry in the river.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub body: String,
    #[serde(rename = "permaLink")]
    pub permalink: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub title: String,
    pub link: String,
    /// Display identifier, unique per process only
    pub id: String,
}

impl FeedItem {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Dedup key for an item: the feed's own id when it has one, otherwise a
/// fingerprint of title and link.
pub fn guid(native_id: &str, title: &str, link: &str) -> String {
    let native_id = native_id.trim();
    if native_id.is_empty() {
        fingerprint(title, link)
    } else {
        native_id.to_string()
    }
}

/// SHA-256 over title bytes followed by link bytes, lowercase hex.
pub fn fingerprint(title: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}
