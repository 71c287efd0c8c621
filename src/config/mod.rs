//! Configuration management for river.
//!
//! Configuration is read from `~/.config/river/config.toml` (or the path given
//! with `--config`). Every field has a default, so the file is optional and
//! may be partial. Command-line flags are applied on top by the CLI layer.

pub mod interval;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feeds: FeedsConfig,
    pub output: OutputConfig,
    pub ingest: IngestConfig,
    pub http: HttpConfig,
}

/// Where the feed list lives and how often feeds are polled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Local path or http(s) URL of the feed list
    pub input: Option<String>,
    #[serde(deserialize_with = "interval::deserialize")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "interval::deserialize")]
    pub list_poll_interval: Duration,
    /// Fetch every feed immediately instead of spreading first fetches out
    pub quickstart: bool,
    /// Upper bound of the random initial delay
    #[serde(deserialize_with = "interval::deserialize")]
    pub jitter_window: Duration,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            input: None,
            poll_interval: Duration::from_secs(3600),
            list_poll_interval: Duration::from_secs(15 * 60),
            quickstart: false,
            jitter_window: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Number of updated feeds retained in the river
    pub max_feeds: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("river.js"),
            max_feeds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Items taken from a single fetch at most
    pub max_items: usize,
    /// Display budget for titles and bodies, in characters
    pub character_count: usize,
    /// Cap on remembered item keys; unbounded when unset
    pub history_limit: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_items: 5,
            character_count: 280,
            history_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Concurrent fetches for one-shot runs
    pub workers: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("river/", env!("CARGO_PKG_VERSION")).to_string(),
            workers: 10,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the default path is
    /// used when the file exists; otherwise the built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that can't produce a usable river.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.character_count == 0 {
            return Err(ConfigError::Invalid(
                "ingest.character_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path: `~/.config/river/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("river").join("config.toml"))
    }

    /// The feed list location, which has no default.
    pub fn input(&self) -> Result<&str, ConfigError> {
        self.feeds
            .input
            .as_deref()
            .filter(|input| !input.trim().is_empty())
            .ok_or(ConfigError::NoInput)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No feed list given; pass --input or set feeds.input")]
    NoInput,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.feeds.poll_interval, Duration::from_secs(3600));
        assert_eq!(config.feeds.list_poll_interval, Duration::from_secs(900));
        assert!(!config.feeds.quickstart);
        assert_eq!(config.output.path, PathBuf::from("river.js"));
        assert_eq!(config.output.max_feeds, 300);
        assert_eq!(config.ingest.max_items, 5);
        assert_eq!(config.ingest.character_count, 280);
        assert_eq!(config.ingest.history_limit, None);
    }

    #[test]
    fn test_partial_config() {
        let content = r#"
[feeds]
input = "feeds.opml"
poll_interval = "30m"
list_poll_interval = 120

[ingest]
history_limit = 10000
"#;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.input().unwrap(), "feeds.opml");
        assert_eq!(config.feeds.poll_interval, Duration::from_secs(1800));
        assert_eq!(config.feeds.list_poll_interval, Duration::from_secs(120));
        assert_eq!(config.feeds.jitter_window, Duration::from_secs(3600));
        assert_eq!(config.ingest.history_limit, Some(10000));
        assert_eq!(config.ingest.max_items, 5);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let content = r#"
[feeds]
poll_interval = "often"
"#;
        assert!(toml::from_str::<Config>(content).is_err());
    }

    #[test]
    fn test_missing_input() {
        let config = Config::default();
        assert!(matches!(config.input(), Err(ConfigError::NoInput)));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\npath = \"/tmp/out.js\"\nmax_feeds = 10").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output.path, PathBuf::from("/tmp/out.js"));
        assert_eq!(config.output.max_feeds, 10);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = Config::load(Some(Path::new("/nonexistent/river.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_zero_character_count_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\ncharacter_count = 0").unwrap();

        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
