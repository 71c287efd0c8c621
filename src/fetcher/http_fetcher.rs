use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::app::Result;
use crate::config::HttpConfig;
use crate::fetcher::{FetchResult, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(FetchResult::NotFound);
        }

        response.error_for_status_ref()?;

        let body = response.bytes().await?.to_vec();

        Ok(FetchResult::Content { body })
    }
}
