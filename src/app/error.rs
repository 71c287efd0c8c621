use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Feed list error: {0}")]
    FeedList(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for RiverError {
    fn from(e: quick_xml::Error) -> Self {
        RiverError::FeedParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiverError>;

impl From<crate::config::ConfigError> for RiverError {
    fn from(e: crate::config::ConfigError) -> Self {
        RiverError::Config(e.to_string())
    }
}
