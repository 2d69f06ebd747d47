//! HTTP client for the monitoring API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::trace;

use super::{ApiClient, FetchError};
use crate::config::ConfigStore;

/// Fallback request timeout when the configured one is missing.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// An [`ApiClient`] backed by `reqwest`.
///
/// Paths are appended verbatim to the base URL, so a base URL with a path
/// prefix (`https://host/monitor`) keeps that prefix.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    description: String,
}

impl HttpClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let parsed = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                parsed.scheme(),
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let base_url = parsed.as_str().trim_end_matches('/').to_string();
        let description = format!("api: {}", base_url);
        Ok(Self {
            client,
            base_url,
            description,
        })
    }

    /// Build from `api.base_url` and `api.timeout` (milliseconds).
    pub fn from_config(config: &ConfigStore) -> Result<Self, FetchError> {
        let base_url = config.get_str("api.base_url", "http://localhost:8000");
        let timeout = config.get_u64("api.timeout", DEFAULT_TIMEOUT_MS);
        Self::new(base_url, Duration::from_millis(timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, FetchError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| FetchError::InvalidUrl(e.to_string()))
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url_for(path)?;
        trace!("GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response.json::<Value>().await.map_err(|e| FetchError::Parse(e.to_string()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
