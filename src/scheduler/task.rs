use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::fetcher::{fetch_document, FetchedDocument, Fetcher};

/// Lifecycle of a scheduled feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting out the initial delay
    Pending,
    /// Fetching on every poll interval
    Polling,
    /// Dropped from the feed list; no further fetches
    Removed,
}

const PENDING: u8 = 0;
const POLLING: u8 = 1;

/// Ties a fetched document to the scheduled task that produced it. Once the
/// feed is removed the lease is revoked and late results are ignored.
#[derive(Debug, Clone)]
pub struct Lease {
    token: CancellationToken,
}

impl Lease {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A lease that is never revoked, for one-shot fetches.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new())
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// A fetched document on its way to the aggregator.
#[derive(Debug)]
pub struct Delivery {
    pub document: FetchedDocument,
    pub lease: Lease,
}

impl Delivery {
    pub fn detached(document: FetchedDocument) -> Self {
        Self {
            document,
            lease: Lease::detached(),
        }
    }
}

/// Shared view of one task's progress.
///
/// `lease` is revoked only when the feed leaves the list; `stop` is its
/// child and also fires on shutdown, so queued results stay valid.
#[derive(Debug, Clone)]
pub(crate) struct TaskStatus {
    lease: CancellationToken,
    stop: CancellationToken,
    state: Arc<AtomicU8>,
}

impl TaskStatus {
    pub(crate) fn new() -> Self {
        let lease = CancellationToken::new();
        Self {
            stop: lease.child_token(),
            lease,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    pub(crate) fn state(&self) -> TaskState {
        if self.stop.is_cancelled() {
            return TaskState::Removed;
        }
        match self.state.load(Ordering::SeqCst) {
            PENDING => TaskState::Pending,
            _ => TaskState::Polling,
        }
    }

    /// Stop the timer and revoke outstanding results.
    pub(crate) fn revoke(&self) {
        self.lease.cancel();
    }

    /// Stop the timer; results already fetched remain valid.
    pub(crate) fn stop(&self) {
        self.stop.cancel();
    }
}

/// Timer loop for a single feed URL.
pub(crate) struct FeedTask {
    pub url: String,
    pub delay: Duration,
    pub poll: Duration,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub results: mpsc::Sender<Delivery>,
    pub status: TaskStatus,
}

impl FeedTask {
    pub(crate) async fn run(self) {
        let token = self.status.stop.clone();

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = sleep(self.delay) => {}
        }
        self.status.state.store(POLLING, Ordering::SeqCst);

        // First tick fires immediately.
        let mut ticker = interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if !self.poll_once().await {
                tracing::debug!("Result channel closed, stopping {}", self.url);
                break;
            }
        }
    }

    /// Fetch once and hand the document on. Returns false when nobody is
    /// listening anymore.
    async fn poll_once(&self) -> bool {
        let Some(document) = fetch_document(self.fetcher.as_ref(), &self.url).await else {
            return true;
        };

        let delivery = Delivery {
            document,
            lease: Lease::new(self.status.lease.clone()),
        };
        self.results.send(delivery).await.is_ok()
    }
}
