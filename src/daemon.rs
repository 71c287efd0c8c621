//! Long-running aggregation.
//!
//! Loads the feed list, starts one polling task per feed and a single
//! aggregator, then re-reads the list on its own interval until SIGINT or
//! SIGTERM arrives.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::aggregator::spawn_aggregator;
use crate::app::{AppContext, Result};
use crate::config::interval::{clamp_period, format_interval};
use crate::feedlist::FeedListSource;
use crate::scheduler::Scheduler;

/// Capacity of the fetch result channel.
const RESULT_BUFFER: usize = 64;

/// Daemon runner
pub struct Daemon {
    ctx: Arc<AppContext>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Run until a termination signal arrives.
    pub async fn run(&self) -> Result<()> {
        let shutdown = CancellationToken::new();
        spawn_signal_listener(shutdown.clone());
        self.run_until(shutdown).await
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// A feed list that cannot be loaded at startup is fatal; later reload
    /// failures keep the current feed set.
    pub async fn run_until(&self, shutdown: CancellationToken) -> Result<()> {
        let config = &self.ctx.config;
        let source = self.ctx.feed_list()?;
        let feeds = source.load(self.ctx.fetcher.as_ref()).await?;

        tracing::info!(
            "river started: {} feeds from {}, writing {} (poll: {}, list poll: {})",
            feeds.len(),
            source,
            config.output.path.display(),
            format_interval(config.feeds.poll_interval),
            format_interval(config.feeds.list_poll_interval),
        );

        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        let aggregator = spawn_aggregator(self.ctx.aggregator(), rx);

        let mut scheduler = Scheduler::new(self.ctx.fetcher.clone(), tx, config.feeds.poll_interval);
        scheduler.schedule_initial(&feeds, config.feeds.quickstart, config.feeds.jitter_window);

        self.watch_feed_list(&source, &mut scheduler, &shutdown).await;

        tracing::info!("river shutting down...");
        // Dropping the scheduler cancels every task and releases its sender;
        // the aggregator drains what is left and stops.
        drop(scheduler);
        if let Err(e) = aggregator.await {
            tracing::error!("Aggregator task failed: {}", e);
        }

        Ok(())
    }

    async fn watch_feed_list(&self, source: &FeedListSource, scheduler: &mut Scheduler, shutdown: &CancellationToken) {
        let mut timer = interval(clamp_period(self.ctx.config.feeds.list_poll_interval));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        timer.tick().await; // Skip the first immediate tick

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }
            self.reload_feed_list(source, scheduler).await;
        }
    }

    /// Re-read the feed list and reconcile the scheduled feeds with it.
    pub async fn reload_feed_list(&self, source: &FeedListSource, scheduler: &mut Scheduler) {
        tracing::debug!("Reloading feed list from {}", source);

        let feeds = match source.load(self.ctx.fetcher.as_ref()).await {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::warn!("Couldn't reload {}: {}; keeping {} feeds", source, e, scheduler.len());
                return;
            }
        };

        let changes = scheduler.reconcile(&feeds);
        for url in &changes.removed {
            tracing::info!("Removing feed: {}", url);
        }
        for url in &changes.added {
            tracing::info!("Adding feed: {}", url);
        }
    }
}

#[cfg(unix)]
fn spawn_signal_listener(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to set up signal handlers: {}; falling back to Ctrl-C", e);
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
        shutdown.cancel();
    });
}

#[cfg(windows)]
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown.cancel();
    });
}
