use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::fetcher::{fetch_document, FetchedDocument, Fetcher};

pub const DEFAULT_WORKERS: usize = 10;

/// Fetches a batch of feeds with bounded concurrency.
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    workers: usize,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Fetch every URL once, yielding documents in completion order. Failed
    /// fetches are logged and left out.
    pub async fn fetch_all(&self, urls: Vec<String>) -> Vec<FetchedDocument> {
        stream::iter(urls)
            .map(|url| {
                let fetcher = self.fetcher.clone();
                async move { fetch_document(fetcher.as_ref(), &url).await }
            })
            .buffer_unordered(self.workers)
            .filter_map(|doc| async move { doc })
            .collect()
            .await
    }
}
