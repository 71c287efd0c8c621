pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::interval::parse_interval;
use crate::config::{Config, ConfigError};

#[derive(Parser)]
#[command(name = "river")]
#[command(about = "Aggregates RSS/Atom feeds into a river.js document", long_about = None)]
pub struct Cli {
    /// Feed list: a local file or http(s) URL (.opml, .yaml, or one URL per line)
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// How often each feed is polled (e.g., "1h", "30m")
    #[arg(long, value_parser = parse_interval, global = true)]
    pub poll: Option<Duration>,

    /// How often the feed list is re-read
    #[arg(long, value_parser = parse_interval, global = true)]
    pub listpoll: Option<Duration>,

    /// Fetch every feed right away instead of spreading out first fetches
    #[arg(long, global = true)]
    pub quickstart: bool,

    /// Number of parallel workers for one-shot fetching
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Config file (default: ~/.config/river/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll feeds continuously (default)
    Run,
    /// Fetch every feed once, write the river, and exit
    Once,
    /// Print the feed list
    Feeds,
}

impl Cli {
    /// Load the config file, then lay the command-line flags over it.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.feeds.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(poll) = self.poll {
            config.feeds.poll_interval = poll;
        }
        if let Some(listpoll) = self.listpoll {
            config.feeds.list_poll_interval = listpoll;
        }
        if self.quickstart {
            config.feeds.quickstart = true;
        }
        if let Some(workers) = self.workers {
            config.http.workers = workers;
        }
    }

    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}
