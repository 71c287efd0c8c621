use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use river::app::AppContext;
use river::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    config.input()?;
    let ctx = AppContext::new(config)?;

    match cli.command() {
        Commands::Run => {
            commands::run_daemon(ctx).await?;
        }
        Commands::Once => {
            commands::run_once(&ctx).await?;
        }
        Commands::Feeds => {
            commands::list_feeds(&ctx).await?;
        }
    }

    Ok(())
}
