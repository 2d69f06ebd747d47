//! Concurrent facet fetching.
//!
//! A refresh cycle issues every request at once and only returns when all of
//! them have settled. A failed request never fails the cycle: the affected
//! facet is replaced by an `{"error": ...}` sentinel instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ApiClient;
use crate::config::ConfigStore;
use crate::data::facet_error;

/// One independently fetched category of dashboard data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Insights,
    Anomalies,
    Predictions,
    Patterns,
    Summary,
    /// Raw readings for the trend charts.
    Series,
    /// Backend health check.
    Health,
}

impl Facet {
    /// The analytic facets shown in the AI section.
    pub const AI: [Facet; 4] = [
        Facet::Insights,
        Facet::Anomalies,
        Facet::Predictions,
        Facet::Patterns,
    ];

    /// Key under `api.endpoints`.
    pub fn key(&self) -> &'static str {
        match self {
            Facet::Insights => "insights",
            Facet::Anomalies => "anomalies",
            Facet::Predictions => "predictions",
            Facet::Patterns => "patterns",
            Facet::Summary => "summary",
            Facet::Series => "series",
            Facet::Health => "health",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Facet::Insights => "Insights",
            Facet::Anomalies => "Anomalias",
            Facet::Predictions => "Predições",
            Facet::Patterns => "Padrões",
            Facet::Summary => "Resumo",
            Facet::Series => "Série temporal",
            Facet::Health => "Saúde da API",
        }
    }

    fn default_path(&self) -> &'static str {
        match self {
            Facet::Insights => "/api/ai/insights",
            Facet::Anomalies => "/api/ai/anomalies",
            Facet::Predictions => "/api/ai/predictions",
            Facet::Patterns => "/api/ai/patterns",
            Facet::Summary => "/api/summary",
            Facet::Series => "/api/series",
            Facet::Health => "/api/system/health",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The reporting window a cycle is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    /// Days of history for insights, anomalies, patterns, summary, violations.
    pub days: u32,
    /// Maximum violation rows.
    pub limit: u32,
    /// Prediction horizon in hours.
    pub hours: u32,
    /// Maximum points requested for the trend series.
    pub points: u32,
}

impl Default for Period {
    fn default() -> Self {
        Self {
            days: 30,
            limit: 10,
            hours: 12,
            points: 500,
        }
    }
}

impl Period {
    /// Read the window from `ui.*`. A value that does not fit a `u32` falls
    /// back to the default rather than wrapping.
    pub fn from_config(config: &ConfigStore) -> Self {
        let d = Self::default();
        let read = |path: &str, default: u32| {
            u32::try_from(config.get_u64(path, u64::from(default))).unwrap_or(default)
        };
        Self {
            days: read("ui.default_days", d.days),
            limit: read("ui.violations_limit", d.limit),
            hours: read("ui.prediction_hours", d.hours),
            points: read("ui.series_max_points", d.points),
        }
    }
}

/// Endpoint paths, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    insights: String,
    anomalies: String,
    predictions: String,
    patterns: String,
    summary: String,
    series: String,
    health: String,
    violations: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            insights: Facet::Insights.default_path().to_string(),
            anomalies: Facet::Anomalies.default_path().to_string(),
            predictions: Facet::Predictions.default_path().to_string(),
            patterns: Facet::Patterns.default_path().to_string(),
            summary: Facet::Summary.default_path().to_string(),
            series: Facet::Series.default_path().to_string(),
            health: Facet::Health.default_path().to_string(),
            violations: "/api/violations".to_string(),
        }
    }
}

impl Endpoints {
    /// Read `api.endpoints.*`, falling back to the standard paths.
    pub fn from_config(config: &ConfigStore) -> Self {
        let d = Self::default();
        let get = |key: &str, fallback: &str| {
            config.get_str(&format!("api.endpoints.{}", key), fallback).to_string()
        };
        Self {
            insights: get("insights", &d.insights),
            anomalies: get("anomalies", &d.anomalies),
            predictions: get("predictions", &d.predictions),
            patterns: get("patterns", &d.patterns),
            summary: get("summary", &d.summary),
            series: get("series", &d.series),
            health: get("health", &d.health),
            violations: get("violations", &d.violations),
        }
    }

    /// Path with query for a facet.
    pub fn facet_path(&self, facet: Facet, period: Period) -> String {
        match facet {
            Facet::Insights => format!("{}?days={}", self.insights, period.days),
            Facet::Anomalies => format!("{}?days={}", self.anomalies, period.days),
            Facet::Predictions => format!("{}?hours={}", self.predictions, period.hours),
            Facet::Patterns => format!("{}?days={}", self.patterns, period.days),
            Facet::Summary => format!("{}?days={}", self.summary, period.days),
            Facet::Series => format!(
                "{}?days={}&max_points={}",
                self.series, period.days, period.points
            ),
            Facet::Health => self.health.clone(),
        }
    }

    pub fn violations_path(&self, period: Period) -> String {
        format!(
            "{}?days={}&limit={}",
            self.violations, period.days, period.limit
        )
    }
}

/// The sentinel that replaces a facet whose request failed.
pub fn error_sentinel(message: impl fmt::Display) -> Value {
    json!({ "error": message.to_string() })
}

/// Results for every facet of one cycle.
///
/// Each entry is either the backend's JSON body or an error sentinel.
/// Disabled facets are `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetSet {
    pub insights: Value,
    pub anomalies: Value,
    pub predictions: Value,
    pub patterns: Value,
    pub summary: Value,
    pub series: Value,
    pub health: Value,
}

impl Default for FacetSet {
    fn default() -> Self {
        Self {
            insights: Value::Null,
            anomalies: Value::Null,
            predictions: Value::Null,
            patterns: Value::Null,
            summary: Value::Null,
            series: Value::Null,
            health: Value::Null,
        }
    }
}

impl FacetSet {
    pub fn get(&self, facet: Facet) -> &Value {
        match facet {
            Facet::Insights => &self.insights,
            Facet::Anomalies => &self.anomalies,
            Facet::Predictions => &self.predictions,
            Facet::Patterns => &self.patterns,
            Facet::Summary => &self.summary,
            Facet::Series => &self.series,
            Facet::Health => &self.health,
        }
    }

    /// AI facets whose payload carries an error.
    pub fn failed_ai(&self) -> Vec<Facet> {
        Facet::AI
            .into_iter()
            .filter(|f| facet_error(self.get(*f)).is_some())
            .collect()
    }
}

/// Everything one refresh cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Issue order of the cycle; later cycles have larger stamps.
    pub seq: u64,
    pub period: Period,
    pub facets: FacetSet,
    /// Raw violation entries, or why they could not be fetched.
    pub violations: Result<Vec<Value>, String>,
}

/// Issues the per-cycle requests against an [`ApiClient`].
#[derive(Clone)]
pub struct DataFetcher {
    client: Arc<dyn ApiClient>,
    endpoints: Endpoints,
    ai_enabled: bool,
    next_seq: Arc<AtomicU64>,
}

impl fmt::Debug for DataFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFetcher")
            .field("client", &self.client.description())
            .field("ai_enabled", &self.ai_enabled)
            .finish()
    }
}

impl DataFetcher {
    pub fn new(client: Arc<dyn ApiClient>, endpoints: Endpoints) -> Self {
        Self {
            client,
            endpoints,
            ai_enabled: true,
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Wire up endpoints and feature flags from configuration.
    pub fn from_config(client: Arc<dyn ApiClient>, config: &ConfigStore) -> Self {
        Self::new(client, Endpoints::from_config(config))
            .with_ai(config.get_bool("features.ai_panels", true))
    }

    /// Skip the analytic facets entirely when disabled.
    pub fn with_ai(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn description(&self) -> &str {
        self.client.description()
    }

    /// Fetch one facet, substituting the error sentinel on failure.
    pub async fn fetch_facet(&self, facet: Facet, period: Period) -> Value {
        let path = self.endpoints.facet_path(facet, period);
        match self.client.get_json(&path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Facet {} failed: {}", facet, e);
                error_sentinel(e)
            }
        }
    }

    async fn fetch_ai_facet(&self, facet: Facet, period: Period) -> Value {
        if self.ai_enabled {
            self.fetch_facet(facet, period).await
        } else {
            Value::Null
        }
    }

    /// Fetch the violation list for the period.
    pub async fn fetch_violations(&self, period: Period) -> Result<Vec<Value>, String> {
        let path = self.endpoints.violations_path(period);
        match self.client.get_json(&path).await {
            Ok(Value::Array(items)) => Ok(items),
            Ok(other) => {
                let reason = facet_error(&other)
                    .unwrap_or_else(|| "resposta inesperada do servidor".to_string());
                warn!("Violations response rejected: {}", reason);
                Err(reason)
            }
            Err(e) => {
                warn!("Violations fetch failed: {}", e);
                Err(e.to_string())
            }
        }
    }

    /// Fetch all facets concurrently; returns once every request settled.
    pub async fn fetch_facets(&self, period: Period) -> FacetSet {
        let (insights, anomalies, predictions, patterns, summary, series, health) =
            tokio::join!(
                self.fetch_ai_facet(Facet::Insights, period),
                self.fetch_ai_facet(Facet::Anomalies, period),
                self.fetch_ai_facet(Facet::Predictions, period),
                self.fetch_ai_facet(Facet::Patterns, period),
                self.fetch_facet(Facet::Summary, period),
                self.fetch_facet(Facet::Series, period),
                self.fetch_facet(Facet::Health, period),
            );
        FacetSet {
            insights,
            anomalies,
            predictions,
            patterns,
            summary,
            series,
            health,
        }
    }

    /// Run one full refresh cycle.
    ///
    /// The sequence stamp is taken when the cycle is issued, so a slow early
    /// cycle keeps its smaller stamp even if it settles last.
    pub async fn run_cycle(&self, period: Period) -> CycleOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!("Cycle {} issued for {:?}", seq, period);

        let (facets, violations) =
            tokio::join!(self.fetch_facets(period), self.fetch_violations(period));

        debug!("Cycle {} settled", seq);
        CycleOutcome {
            seq,
            period,
            facets,
            violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockClient;
    use std::time::Duration;

    fn period() -> Period {
        Period {
            days: 30,
            limit: 10,
            hours: 12,
            points: 500,
        }
    }

    #[test]
    fn test_paths_match_backend_routes() {
        let endpoints = Endpoints::default();
        let p = period();
        assert_eq!(endpoints.facet_path(Facet::Insights, p), "/api/ai/insights?days=30");
        assert_eq!(endpoints.facet_path(Facet::Anomalies, p), "/api/ai/anomalies?days=30");
        assert_eq!(
            endpoints.facet_path(Facet::Predictions, p),
            "/api/ai/predictions?hours=12"
        );
        assert_eq!(endpoints.facet_path(Facet::Patterns, p), "/api/ai/patterns?days=30");
        assert_eq!(endpoints.facet_path(Facet::Summary, p), "/api/summary?days=30");
        assert_eq!(
            endpoints.facet_path(Facet::Series, p),
            "/api/series?days=30&max_points=500"
        );
        assert_eq!(endpoints.facet_path(Facet::Health, p), "/api/system/health");
        assert_eq!(endpoints.violations_path(p), "/api/violations?days=30&limit=10");
    }

    #[test]
    fn test_period_and_endpoints_from_config() {
        let mut config = ConfigStore::default();
        config.set("ui.violations_limit", json!(20));
        config.set("api.endpoints.violations", json!("/v2/violations"));

        let p = Period::from_config(&config);
        assert_eq!(p.limit, 20);
        assert_eq!(p.days, 30);
        assert_eq!(p.hours, 12);
        assert_eq!(p.points, 500);

        let endpoints = Endpoints::from_config(&config);
        assert_eq!(endpoints.violations_path(p), "/v2/violations?days=30&limit=20");
    }

    #[test]
    fn test_oversized_period_values_fall_back_to_defaults() {
        let store = ConfigStore::from_value(
            json!({ "ui": { "default_days": 4_294_967_303u64, "violations_limit": 25 } }),
            crate::config::Environment::Production,
        );
        let p = Period::from_config(&store);
        // 2^32 + 7 would wrap to 7 with a plain cast
        assert_eq!(p.days, 30);
        assert_eq!(p.limit, 25);
    }

    #[tokio::test]
    async fn test_one_failed_facet_does_not_block_others() {
        let client = MockClient::new()
            .respond("/api/ai/insights", json!({ "insights": [] }))
            .respond("/api/ai/anomalies", json!({ "anomalies": [], "anomaly_rate": 0.0 }))
            .fail("/api/ai/predictions", 503)
            .respond("/api/ai/patterns", json!({ "violation_rate": 1.5 }))
            .respond("/api/summary", json!({ "total_measurements": 10 }))
            .respond("/api/series", json!([{ "timestamp": "t", "temperature": 18.0 }]))
            .fail("/api/system/health", 500)
            .respond("/api/violations", json!([]));
        let fetcher = DataFetcher::new(Arc::new(client), Endpoints::default());

        let outcome = fetcher.run_cycle(period()).await;

        assert_eq!(outcome.facets.series[0]["temperature"], 18.0);
        assert_eq!(outcome.facets.health, json!({ "error": "HTTP 500" }));

        assert_eq!(outcome.facets.predictions, json!({ "error": "HTTP 503" }));
        assert_eq!(outcome.facets.patterns["violation_rate"], 1.5);
        assert_eq!(outcome.facets.failed_ai(), vec![Facet::Predictions]);
        assert_eq!(outcome.violations, Ok(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_run_concurrently() {
        let client = MockClient::new()
            .with_delay(Duration::from_millis(100))
            .respond("/api/ai/insights", json!({}))
            .respond("/api/ai/anomalies", json!({}))
            .respond("/api/ai/predictions", json!({}))
            .respond("/api/ai/patterns", json!({}))
            .respond("/api/summary", json!({}))
            .respond("/api/series", json!([]))
            .respond("/api/system/health", json!({ "status": "healthy" }))
            .respond("/api/violations", json!([]));
        let client = Arc::new(client);
        let fetcher = DataFetcher::new(client.clone(), Endpoints::default());

        let start = tokio::time::Instant::now();
        let _ = fetcher.run_cycle(period()).await;

        // Eight sequential requests would take 800ms
        assert!(start.elapsed() < Duration::from_millis(200));
        assert_eq!(client.calls().len(), 8);
    }

    #[tokio::test]
    async fn test_sequence_stamps_increase() {
        let fetcher = DataFetcher::new(Arc::new(MockClient::new()), Endpoints::default());
        let a = fetcher.run_cycle(period()).await;
        let b = fetcher.run_cycle(period()).await;
        assert!(b.seq > a.seq);

        // Clones share the counter
        let c = fetcher.clone().run_cycle(period()).await;
        assert!(c.seq > b.seq);
    }

    #[tokio::test]
    async fn test_violations_error_shapes() {
        let client = MockClient::new().respond("/api/violations", json!({ "error": "db down" }));
        let fetcher = DataFetcher::new(Arc::new(client), Endpoints::default());
        assert_eq!(fetcher.fetch_violations(period()).await, Err("db down".to_string()));

        let client = MockClient::new().respond("/api/violations", json!({ "items": [] }));
        let fetcher = DataFetcher::new(Arc::new(client), Endpoints::default());
        assert!(fetcher.fetch_violations(period()).await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_ai_skips_requests() {
        let client = Arc::new(MockClient::new().respond("/api/summary", json!({})));
        let fetcher = DataFetcher::new(client.clone(), Endpoints::default()).with_ai(false);

        let facets = fetcher.fetch_facets(period()).await;
        assert_eq!(facets.insights, Value::Null);
        assert_eq!(facets.summary, json!({}));

        let mut calls = client.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "/api/series?days=30&max_points=500".to_string(),
                "/api/summary?days=30".to_string(),
                "/api/system/health".to_string(),
            ]
        );
    }
}
