//! # River
//!
//! A feed aggregator that polls RSS/Atom feeds and publishes a "river of
//! news": a bounded, newest-first list of recently updated feeds, written as
//! a JSONP document (`river.js`).
//!
//! ## Architecture
//!
//! ```text
//! Feed list → Scheduler → Fetcher → Aggregator (Normalizer + History) → River store
//! ```
//!
//! Every feed is polled by its own task; all results funnel through one
//! channel into a single aggregator, which owns the dedup history and the
//! river.
//!
//! ## Quick Start
//!
//! ```bash
//! # Poll feeds listed in an OPML file, writing ./river.js
//! river --input feeds.opml
//!
//! # Fetch everything once and exit
//! river once --input https://example.com/feeds.yaml --output /srv/www/river.js
//! ```

/// The single consumer of fetched documents; owns the river.
pub mod aggregator;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// fetcher and normalizer.
pub mod app;

/// Command-line interface using clap.
///
/// - `run` - Poll feeds until interrupted (default)
/// - `once` - Fetch every feed once and write the river
/// - `feeds` - Print the resolved feed list
pub mod cli;

/// Configuration loaded from `~/.config/river/config.toml`.
pub mod config;

/// Long-running mode: scheduling, list reloads, signal handling.
pub mod daemon;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): one updated feed with its new items
/// - [`FeedItem`](domain::FeedItem): a cleaned-up item ready for display
/// - [`River`](domain::River): the published document
pub mod domain;

/// Loading the feed list from OPML, YAML or plain text.
pub mod feedlist;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for document fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Bounded concurrent fetching
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Streams RSS 0.9x/2.0 and Atom 1.0 with quick-xml, keeps only items not
/// seen before and cleans their text for display.
pub mod normalizer;

/// Per-feed polling tasks and feed-list reconciliation.
pub mod scheduler;

/// Dedup history and river output.
///
/// - [`History`](store::History): Trait for remembering item keys
/// - [`RiverStore`](store::RiverStore): Trait for persisting the river
/// - [`FileRiverStore`](store::FileRiverStore): Atomic JSONP file writer
pub mod store;
