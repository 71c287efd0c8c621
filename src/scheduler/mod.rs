//! Per-feed polling.
//!
//! Every feed URL gets its own task that waits out an initial delay and then
//! fetches on a fixed interval. Fetched documents are sent over a channel to
//! the single aggregator; tasks never touch shared river state. The active
//! set is reconciled against the feed list: URLs that disappear have their
//! task cancelled, new URLs are started right away, and unchanged URLs keep
//! their timers.

mod task;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::interval::{clamp_period, format_interval, MAX_PERIOD};
use crate::fetcher::Fetcher;

pub use task::{Delivery, Lease, TaskState};
use task::{FeedTask, TaskStatus};

/// Random initial delay within `window`, or none at all for quickstart.
pub fn initial_delay(quickstart: bool, window: Duration) -> Duration {
    let secs = window.min(MAX_PERIOD).as_secs();
    if quickstart || secs == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rand::rng().random_range(0..secs))
}

/// Feeds that changed in one reconciliation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

struct ScheduledFeed {
    status: TaskStatus,
    // Detached on removal; the task exits at its next cancellation check.
    _handle: JoinHandle<()>,
}

/// Owns the set of active feed tasks.
pub struct Scheduler {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    results: mpsc::Sender<Delivery>,
    poll: Duration,
    tasks: HashMap<String, ScheduledFeed>,
}

impl Scheduler {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, results: mpsc::Sender<Delivery>, poll: Duration) -> Self {
        Self {
            fetcher,
            results,
            poll: clamp_period(poll),
            tasks: HashMap::new(),
        }
    }

    /// Start polling `url` after `delay`. Returns false if it is already
    /// scheduled.
    pub fn schedule(&mut self, url: &str, delay: Duration) -> bool {
        if self.tasks.contains_key(url) {
            return false;
        }

        let status = TaskStatus::new();
        let task = FeedTask {
            url: url.to_string(),
            delay,
            poll: self.poll,
            fetcher: Arc::clone(&self.fetcher),
            results: self.results.clone(),
            status: status.clone(),
        };
        let handle = tokio::spawn(task.run());

        self.tasks.insert(
            url.to_string(),
            ScheduledFeed {
                status,
                _handle: handle,
            },
        );
        true
    }

    /// Stop polling `url`. An in-flight fetch finishes, but its result is
    /// no longer accepted.
    pub fn unschedule(&mut self, url: &str) -> bool {
        match self.tasks.remove(url) {
            Some(feed) => {
                feed.status.revoke();
                true
            }
            None => false,
        }
    }

    /// Schedule the startup feed set, spreading first fetches over
    /// `window` unless `quickstart` is set.
    pub fn schedule_initial(&mut self, urls: &[String], quickstart: bool, window: Duration) {
        for url in urls {
            let delay = initial_delay(quickstart, window);
            if self.schedule(url, delay) {
                tracing::info!(
                    "Polling {} every {} starting in {}",
                    url,
                    format_interval(self.poll),
                    format_interval(delay)
                );
            }
        }
    }

    /// Bring the active set in line with `urls`. New feeds are fetched
    /// immediately; feeds present in both keep their existing timers.
    pub fn reconcile(&mut self, urls: &[String]) -> Reconciliation {
        let wanted: HashSet<&str> = urls.iter().map(String::as_str).collect();

        let mut removed: Vec<String> = self
            .tasks
            .keys()
            .filter(|url| !wanted.contains(url.as_str()))
            .cloned()
            .collect();
        removed.sort();
        for url in &removed {
            self.unschedule(url);
        }

        let mut added = Vec::new();
        for url in urls {
            if self.schedule(url, Duration::ZERO) {
                added.push(url.clone());
            }
        }

        Reconciliation { added, removed }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.tasks.contains_key(url)
    }

    pub fn state(&self, url: &str) -> Option<TaskState> {
        self.tasks.get(url).map(|feed| feed.status.state())
    }

    /// Currently scheduled URLs, sorted.
    pub fn active_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.tasks.keys().cloned().collect();
        urls.sort();
        urls
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every task. Results already sent keep their leases so the
    /// aggregator can still publish them.
    pub fn shutdown(&mut self) {
        for (_, feed) in self.tasks.drain() {
            feed.status.stop();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
