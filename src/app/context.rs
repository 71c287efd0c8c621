use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::app::error::Result;
use crate::config::Config;
use crate::feedlist::FeedListSource;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::{IngestLimits, Normalizer};
use crate::store::{FileRiverStore, MemoryHistory};

pub type RiverAggregator = Aggregator<MemoryHistory, FileRiverStore>;

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub parallel_fetcher: ParallelFetcher,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.http)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        let parallel_fetcher = ParallelFetcher::with_workers(fetcher.clone(), config.http.workers);
        let normalizer = Normalizer::new(IngestLimits {
            max_items: config.ingest.max_items,
            character_count: config.ingest.character_count,
        });

        Self {
            config,
            fetcher,
            parallel_fetcher,
            normalizer,
        }
    }

    pub fn feed_list(&self) -> Result<FeedListSource> {
        FeedListSource::parse(self.config.input()?)
    }

    pub async fn load_feeds(&self) -> Result<Vec<String>> {
        self.feed_list()?.load(self.fetcher.as_ref()).await
    }

    /// A fresh aggregator writing to the configured output path.
    pub fn aggregator(&self) -> RiverAggregator {
        Aggregator::new(
            self.normalizer.clone(),
            MemoryHistory::with_limit(self.config.ingest.history_limit),
            FileRiverStore::new(&self.config.output.path),
            self.config.output.max_feeds,
        )
    }
}
