pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;
pub use parallel::ParallelFetcher;

#[derive(Debug)]
pub enum FetchResult {
    /// Document body fetched successfully
    Content { body: Vec<u8> },
    /// The server answered 404
    NotFound,
}

/// A fetched feed document together with the URL it came from.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}

/// Fetch `url` once, logging failures. `None` means this cycle is skipped.
pub async fn fetch_document(fetcher: &(dyn Fetcher + Send + Sync), url: &str) -> Option<FetchedDocument> {
    match fetcher.fetch(url).await {
        Ok(FetchResult::Content { body }) => Some(FetchedDocument {
            url: url.to_string(),
            body,
        }),
        Ok(FetchResult::NotFound) => {
            tracing::warn!("{:?} returned 404", url);
            None
        }
        Err(e) => {
            tracing::warn!("Fetching {} failed: {}", url, e);
            None
        }
    }
}
