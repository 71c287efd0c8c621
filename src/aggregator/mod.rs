//! The single owner of the river.
//!
//! Every fetched document arrives here over a channel and is handled one at
//! a time, so the dedup history and the river never see concurrent writers.

use std::time::Instant;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::River;
use crate::normalizer::Normalizer;
use crate::scheduler::Delivery;
use crate::store::{History, RiverStore};

/// What one document did to the river.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The feed was removed before its result arrived
    Stale,
    /// The document could not be parsed
    Invalid,
    /// Nothing new; the output was left alone
    Unchanged,
    Published { new_items: usize, persisted: bool },
}

pub struct Aggregator<H, S> {
    normalizer: Normalizer,
    history: H,
    store: S,
    river: River,
    max_feeds: usize,
}

impl<H: History, S: RiverStore> Aggregator<H, S> {
    pub fn new(normalizer: Normalizer, history: H, store: S, max_feeds: usize) -> Self {
        Self {
            normalizer,
            history,
            store,
            river: River::new(),
            max_feeds,
        }
    }

    pub fn river(&self) -> &River {
        &self.river
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fold one fetched document into the river.
    pub fn process(&mut self, delivery: Delivery) -> CycleOutcome {
        let Delivery { document, lease } = delivery;
        if !lease.is_active() {
            tracing::debug!("Discarding result for removed feed {}", document.url);
            return CycleOutcome::Stale;
        }

        let started = Instant::now();
        let feed = match self
            .normalizer
            .normalize(&document.url, &document.body, &mut self.history)
        {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Couldn't parse {}: {}", document.url, e);
                return CycleOutcome::Invalid;
            }
        };

        if !feed.has_items() {
            tracing::debug!("No new items from {}", document.url);
            return CycleOutcome::Unchanged;
        }

        let new_items = feed.items.len();
        tracing::info!("Updating {} with {} new items", feed.title, new_items);

        self.river.publish(feed, self.max_feeds);
        self.river.touch(Local::now(), started.elapsed());

        let persisted = match self.store.persist(&self.river) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write river: {}", e);
                false
            }
        };

        CycleOutcome::Published {
            new_items,
            persisted,
        }
    }

    /// Process deliveries until every sender is gone.
    pub async fn run(mut self, mut results: mpsc::Receiver<Delivery>) -> Self {
        while let Some(delivery) = results.recv().await {
            self.process(delivery);
        }
        tracing::debug!("Result channel closed, aggregator stopping");
        self
    }
}

/// Run the aggregator on its own task. The handle resolves once the channel
/// closes, giving the aggregator back.
pub fn spawn_aggregator<H, S>(aggregator: Aggregator<H, S>, results: mpsc::Receiver<Delivery>) -> JoinHandle<Aggregator<H, S>>
where
    H: History + Send + 'static,
    S: RiverStore + Send + 'static,
{
    tokio::spawn(aggregator.run(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::app::{Result, RiverError};
    use crate::fetcher::FetchedDocument;
    use crate::normalizer::IngestLimits;
    use crate::fetcher::testing::StaticFetcher;
    use crate::scheduler::{Lease, Scheduler};
    use std::time::Duration;
    use crate::store::MemoryHistory;
    use tokio_util::sync::CancellationToken;

    /// Keeps every persisted snapshot.
    #[derive(Clone, Default)]
    struct RecordingStore {
        writes: Arc<Mutex<Vec<River>>>,
    }

    impl RecordingStore {
        fn count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }

        fn last(&self) -> Option<River> {
            self.writes.lock().unwrap().last().cloned()
        }
    }

    impl RiverStore for RecordingStore {
        fn persist(&self, river: &River) -> Result<()> {
            self.writes.lock().unwrap().push(river.clone());
            Ok(())
        }
    }

    struct FailingStore;

    impl RiverStore for FailingStore {
        fn persist(&self, _river: &River) -> Result<()> {
            Err(RiverError::Other("disk full".into()))
        }
    }

    fn rss(items: &[(&str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, guid)| format!("<item><title>{}</title><guid>{}</guid></item>", title, guid))
            .collect();
        format!("<rss><channel><title>Feed</title>{}</channel></rss>", body)
    }

    fn delivery(url: &str, body: &str) -> Delivery {
        Delivery::detached(FetchedDocument {
            url: url.to_string(),
            body: body.as_bytes().to_vec(),
        })
    }

    fn aggregator<S: RiverStore>(store: S, max_feeds: usize) -> Aggregator<MemoryHistory, S> {
        Aggregator::new(Normalizer::new(IngestLimits::default()), MemoryHistory::new(), store, max_feeds)
    }

    #[test]
    fn test_publishes_new_items() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store.clone(), 300);

        let outcome = agg.process(delivery("https://a/feed", &rss(&[("One", "1"), ("Two", "2")])));
        assert_eq!(
            outcome,
            CycleOutcome::Published {
                new_items: 2,
                persisted: true
            }
        );
        assert_eq!(store.count(), 1);

        let written = store.last().unwrap();
        assert_eq!(written.feeds().len(), 1);
        assert_eq!(written.feeds()[0].url, "https://a/feed");
        assert!(!written.metadata.when_gmt.is_empty());
    }

    #[test]
    fn test_overlapping_document_does_not_rewrite() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store.clone(), 300);

        agg.process(delivery("https://a/feed", &rss(&[("Two", "2"), ("One", "1")])));
        let outcome = agg.process(delivery("https://a/feed", &rss(&[("Two", "2"), ("One", "1")])));

        assert_eq!(outcome, CycleOutcome::Unchanged);
        assert_eq!(store.count(), 1);
        assert_eq!(agg.river().feeds().len(), 1);
    }

    #[test]
    fn test_only_unseen_prefix_published() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store.clone(), 300);

        agg.process(delivery("https://a/feed", &rss(&[("One", "1")])));
        agg.process(delivery("https://a/feed", &rss(&[("Three", "3"), ("Two", "2"), ("One", "1")])));

        let river = agg.river();
        assert_eq!(river.feeds().len(), 2);
        let titles: Vec<&str> = river.feeds()[0].items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Three", "Two"]);
    }

    #[test]
    fn test_river_capped_newest_first() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store, 3);

        for n in 0..5 {
            let url = format!("https://feed{}/rss", n);
            agg.process(delivery(&url, &rss(&[("Item", &n.to_string())])));
        }

        let feeds = agg.river().feeds();
        assert_eq!(feeds.len(), 3);
        assert_eq!(feeds[0].url, "https://feed4/rss");
        assert_eq!(feeds[2].url, "https://feed2/rss");
    }

    #[test]
    fn test_stale_delivery_discarded() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store.clone(), 300);

        let token = CancellationToken::new();
        let document = FetchedDocument {
            url: "https://x/feed".into(),
            body: rss(&[("Late", "late")]).into_bytes(),
        };
        token.cancel();

        let outcome = agg.process(Delivery {
            document,
            lease: Lease::new(token),
        });
        assert_eq!(outcome, CycleOutcome::Stale);
        assert!(agg.river().feeds().is_empty());
        assert!(agg.history().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_invalid_document_leaves_state() {
        let store = RecordingStore::default();
        let mut agg = aggregator(store.clone(), 300);

        let outcome = agg.process(delivery("https://a/feed", "<rss><channel><item></channel>"));
        assert_eq!(outcome, CycleOutcome::Invalid);
        assert!(agg.history().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_persist_failure_keeps_state() {
        let mut agg = aggregator(FailingStore, 300);

        let outcome = agg.process(delivery("https://a/feed", &rss(&[("One", "1")])));
        assert_eq!(
            outcome,
            CycleOutcome::Published {
                new_items: 1,
                persisted: false
            }
        );
        assert_eq!(agg.river().feeds().len(), 1);
        assert_eq!(agg.history().len(), 1);
    }

    #[tokio::test]
    async fn test_run_until_closed() {
        let store = RecordingStore::default();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_aggregator(aggregator(store.clone(), 300), rx);

        tx.send(delivery("https://a/feed", &rss(&[("One", "1")]))).await.unwrap();
        tx.send(delivery("https://b/feed", &rss(&[("Two", "2")]))).await.unwrap();
        drop(tx);

        let agg = handle.await.unwrap();
        assert_eq!(agg.river().feeds()[0].url, "https://b/feed");
        assert_eq!(store.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_queued_at_shutdown_are_published() {
        let fetcher = Arc::new(StaticFetcher::new().with("https://a/feed", &rss(&[("One", "1")])));
        let store = RecordingStore::default();
        let (tx, rx) = mpsc::channel(8);

        let mut scheduler = Scheduler::new(fetcher.clone(), tx, Duration::from_secs(3600));
        scheduler.schedule("https://a/feed", Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fetcher.calls("https://a/feed"), 1);

        // The delivery is still sitting in the channel when the tasks stop.
        drop(scheduler);
        let agg = spawn_aggregator(aggregator(store.clone(), 300), rx).await.unwrap();

        assert_eq!(agg.river().feeds().len(), 1);
        assert_eq!(store.count(), 1);
    }
}
