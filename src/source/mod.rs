//! Backend access for dashboard data.
//!
//! This module provides a trait-based abstraction over the monitoring API
//! ([`ApiClient`]) with an HTTP implementation, and the [`DataFetcher`] that
//! runs the concurrent per-cycle requests on top of it.

mod error;
mod fetcher;
mod http;

pub use error::FetchError;
pub use fetcher::{
    error_sentinel, CycleOutcome, DataFetcher, Endpoints, Facet, FacetSet, Period,
};
pub use http::HttpClient;

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

/// Trait for issuing GET requests against the monitoring API.
///
/// Implementations resolve `path` (which includes its query string) against
/// their own base location and return the parsed JSON body.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use envwatch::{ApiClient, HttpClient};
///
/// # tokio_test::block_on(async {
/// let client = HttpClient::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
/// let body = client.get_json("/api/violations?days=30&limit=10").await;
/// # });
/// ```
#[async_trait]
pub trait ApiClient: Send + Sync + Debug {
    /// Fetch and parse one JSON document.
    ///
    /// Transport failures, non-2xx statuses and unparsable bodies are all
    /// errors.
    async fn get_json(&self, path: &str) -> Result<Value, FetchError>;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
