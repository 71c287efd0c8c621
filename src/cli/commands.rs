use std::sync::Arc;

use crate::aggregator::CycleOutcome;
use crate::app::{AppContext, Result};
use crate::daemon::Daemon;
use crate::scheduler::Delivery;

pub async fn run_daemon(ctx: AppContext) -> Result<()> {
    Daemon::new(Arc::new(ctx)).run().await
}

/// Fetch every feed once and write the river.
pub async fn run_once(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.load_feeds().await?;

    if feeds.is_empty() {
        println!("No feeds to update");
        return Ok(());
    }

    println!("Updating {} feeds...", feeds.len());

    let documents = ctx.parallel_fetcher.fetch_all(feeds).await;
    let fetched = documents.len();

    let mut aggregator = ctx.aggregator();
    let mut updated = 0;
    let mut new_items = 0;
    let mut errors = 0;

    for document in documents {
        match aggregator.process(Delivery::detached(document)) {
            CycleOutcome::Published { new_items: n, persisted } => {
                updated += 1;
                new_items += n;
                if !persisted {
                    errors += 1;
                }
            }
            CycleOutcome::Invalid => errors += 1,
            CycleOutcome::Unchanged | CycleOutcome::Stale => {}
        }
    }

    println!(
        "Fetched {} feeds, {} updated with {} new items, {} errors",
        fetched, updated, new_items, errors
    );
    if updated > 0 {
        println!("Wrote {}", ctx.config.output.path.display());
    }

    Ok(())
}

pub async fn list_feeds(ctx: &AppContext) -> Result<()> {
    let source = ctx.feed_list()?;
    let feeds = source.load(ctx.fetcher.as_ref()).await?;

    if feeds.is_empty() {
        println!("No feeds in {}", source);
        return Ok(());
    }

    for url in feeds {
        println!("{}", url);
    }

    Ok(())
}
