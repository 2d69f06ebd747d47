//! The coordinator.
//!
//! [`Dashboard`] owns every cooperating part (configuration, fetcher,
//! filter engine, document) and is the only place where a finished cycle is
//! turned into rendered output.
//!
//! ```text
//!              run_cycle()                 apply()
//! DataFetcher ─────────────▶ CycleOutcome ─────────▶ Dashboard
//!                              (seq, ...)     │ stale? ──▶ dropped
//!                                             ▼
//!                       FilterEngine ──▶ render::* ──▶ HtmlDocument
//! ```
//!
//! Overlapping cycles are allowed. Each outcome carries the sequence stamp
//! it was issued with and is applied only if it is newer than the last one
//! applied, so a slow early response can never overwrite a later one.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::data::format::{display_offset, DEFAULT_UTC_OFFSET_MINUTES};
use crate::data::{
    parse_records, ApiHealth, History, Measurement, Panel, RecordStatus, Series, SummaryKpis,
};
use crate::filter::{FilterEngine, FilterToggles};
use crate::render::{self, AiStatus, HtmlDocument, ViolationRow};
use crate::source::{ApiClient, CycleOutcome, DataFetcher, FacetSet, Period};

/// Page title used for exports.
pub const TITLE: &str = "Monitoramento Ambiental";

/// A record as written by [`Dashboard::export_records`].
#[derive(Debug, Serialize)]
struct ExportedRecord<'a> {
    #[serde(flatten)]
    record: &'a Measurement,
    status: RecordStatus,
    temp_violation: bool,
    rh_violation: bool,
}

#[derive(Debug, Serialize)]
struct RecordsExport<'a> {
    generated_at: String,
    period: Period,
    filter: &'static str,
    total: usize,
    records: Vec<ExportedRecord<'a>>,
}

/// Holds the state of one dashboard.
#[derive(Debug)]
pub struct Dashboard {
    config: ConfigStore,
    fetcher: DataFetcher,
    filter: FilterEngine,
    document: HtmlDocument,
    offset: FixedOffset,
    period: Period,
    facets: FacetSet,
    history: History,
    applied_seq: u64,
    violations_error: Option<String>,
    last_updated: Option<Instant>,
}

impl Dashboard {
    pub fn new(config: ConfigStore, fetcher: DataFetcher, document: HtmlDocument) -> Self {
        let offset = display_offset(
            config.get_i64("ui.utc_offset_minutes", DEFAULT_UTC_OFFSET_MINUTES),
        );
        let period = Period::from_config(&config);
        info!(
            "Dashboard ready ({} environment, {})",
            config.environment(),
            fetcher.description()
        );
        Self {
            config,
            fetcher,
            filter: FilterEngine::new(),
            document,
            offset,
            period,
            facets: FacetSet::default(),
            history: History::new(),
            applied_seq: 0,
            violations_error: None,
            last_updated: None,
        }
    }

    /// Standard dashboard layout over the given client.
    pub fn from_config(config: ConfigStore, client: Arc<dyn ApiClient>) -> Self {
        let fetcher = DataFetcher::from_config(client, &config);
        Self::new(config, fetcher, HtmlDocument::dashboard())
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// A handle to the fetcher, sharing its sequence counter.
    pub fn fetcher(&self) -> &DataFetcher {
        &self.fetcher
    }

    pub fn document(&self) -> &HtmlDocument {
        &self.document
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Stamp of the last applied cycle, 0 before the first.
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    /// Why the last violations fetch failed, if it did.
    pub fn violations_error(&self) -> Option<&str> {
        self.violations_error.as_deref()
    }

    pub fn summary(&self) -> Panel<SummaryKpis> {
        SummaryKpis::from_facet(&self.facets.summary)
    }

    pub fn series(&self) -> Panel<Series> {
        Series::from_facet(&self.facets.series)
    }

    pub fn health(&self) -> ApiHealth {
        ApiHealth::from_facet(&self.facets.health)
    }

    pub fn ai_status(&self) -> AiStatus {
        AiStatus::from_facets(&self.facets, self.fetcher.ai_enabled())
    }

    pub fn toggles(&self) -> FilterToggles {
        self.filter.toggles()
    }

    /// The cached, unfiltered record set.
    pub fn records(&self) -> &[Measurement] {
        self.filter.records()
    }

    /// Records passing the current toggles.
    pub fn visible_records(&self) -> Vec<Measurement> {
        self.filter.apply()
    }

    /// Display rows for the records passing the current toggles.
    pub fn rows(&self) -> Vec<ViolationRow> {
        render::violations::rows(&self.visible_records(), self.offset)
    }

    /// Allowed values for the row limit selector.
    pub fn limit_options(&self) -> Vec<u32> {
        let options: Vec<u32> = self
            .config
            .lookup("ui.violations_limit_options")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_u64())
                    .filter_map(|n| u32::try_from(n).ok())
                    .collect()
            })
            .unwrap_or_default();
        if options.is_empty() {
            vec![self.period.limit]
        } else {
            options
        }
    }

    /// Change the row limit. Out-of-bounds values are rejected.
    pub fn set_limit(&mut self, limit: u32) -> bool {
        if !self.config.set_validated("ui.violations_limit", json!(limit)) {
            warn!("Ignoring violations limit {}: out of bounds", limit);
            return false;
        }
        self.period.limit = limit;
        render::render_controls(&mut self.document, self.filter.toggles(), limit);
        true
    }

    /// Change the reporting window. Out-of-bounds values are rejected.
    pub fn set_days(&mut self, days: u32) -> bool {
        if !self.config.set_validated("ui.default_days", json!(days)) {
            warn!("Ignoring period of {} days: out of bounds", days);
            return false;
        }
        self.period.days = days;
        true
    }

    /// Apply a finished cycle.
    ///
    /// Returns `false` when the outcome is stale (a newer cycle has already
    /// been applied) and was dropped untouched.
    pub fn apply(&mut self, outcome: CycleOutcome) -> bool {
        if outcome.seq <= self.applied_seq {
            debug!(
                "Discarding stale cycle {} (applied {})",
                outcome.seq, self.applied_seq
            );
            return false;
        }
        self.applied_seq = outcome.seq;
        self.facets = outcome.facets;

        match outcome.violations {
            Ok(entries) => {
                let records = parse_records(&entries);
                debug!(
                    "Cycle {}: {} records ({} entries)",
                    outcome.seq,
                    records.len(),
                    entries.len()
                );
                self.filter.replace(records);
                self.violations_error = None;
                self.render_table();
            }
            Err(message) => {
                // Keep the previous records cached for the filter
                render::render_error(&mut self.document, &message);
                self.violations_error = Some(message);
            }
        }

        let summary = self.summary();
        if let Some(kpis) = summary.ready() {
            self.history.record(kpis, Instant::now());
        }
        render::render_kpis(&mut self.document, &summary);
        let series = self.series();
        render::render_series(&mut self.document, &series, self.offset);
        let health = self.health();
        render::render_health(&mut self.document, health);
        render::render_ai(&mut self.document, &self.facets, self.fetcher.ai_enabled());
        render::render_controls(&mut self.document, self.filter.toggles(), self.period.limit);

        self.last_updated = Some(Instant::now());
        true
    }

    /// Fetch one cycle for the current period and apply it.
    pub async fn refresh(&mut self) -> bool {
        let outcome = self.fetcher.run_cycle(self.period).await;
        self.apply(outcome)
    }

    pub fn set_toggles(&mut self, toggles: FilterToggles) {
        self.filter.set_toggles(toggles);
        self.on_filter_changed();
    }

    pub fn toggle_temperature(&mut self) {
        self.filter.toggle_temperature();
        self.on_filter_changed();
    }

    pub fn toggle_humidity(&mut self) {
        self.filter.toggle_humidity();
        self.on_filter_changed();
    }

    fn on_filter_changed(&mut self) {
        debug!("Filter now {}", self.filter.toggles().describe());
        self.render_table();
        render::render_controls(&mut self.document, self.filter.toggles(), self.period.limit);
    }

    fn render_table(&mut self) {
        let visible = self.filter.apply();
        render::render_table(&mut self.document, Some(visible.as_slice()), self.offset);
    }

    fn generated_at(&self) -> String {
        Utc::now()
            .with_timezone(&self.offset)
            .format("%d/%m/%Y %H:%M")
            .to_string()
    }

    /// Write the current document as a standalone page.
    pub fn export_page(&self, path: &Path) -> Result<()> {
        render::write_page(&self.document, TITLE, &self.generated_at(), path)?;
        info!("Exported dashboard to {}", path.display());
        Ok(())
    }

    /// The records passing the current toggles, with their classification,
    /// as pretty-printed JSON.
    pub fn records_json(&self) -> Result<String> {
        let visible = self.visible_records();
        let export = RecordsExport {
            generated_at: self.generated_at(),
            period: self.period,
            filter: self.filter.toggles().describe(),
            total: self.records().len(),
            records: visible
                .iter()
                .map(|record| ExportedRecord {
                    record,
                    status: record.status(),
                    temp_violation: record.temp_violation(),
                    rh_violation: record.rh_violation(),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Write [`Dashboard::records_json`] to `path`.
    pub fn export_records(&self, path: &Path) -> Result<()> {
        let json = self.records_json()?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Exported {} records to {}", self.visible_records().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ids;
    use crate::source::mock::MockClient;
    use crate::source::Facet;
    use serde_json::Value;

    fn dashboard(client: MockClient) -> Dashboard {
        Dashboard::from_config(ConfigStore::default(), Arc::new(client))
    }

    fn backend() -> MockClient {
        MockClient::new()
            .respond(
                "/api/violations",
                json!([
                    { "timestamp": "2024-01-01T03:00:00Z", "temperature": 18.0, "humidity": 50.0 },
                    { "timestamp": "2024-01-01T04:00:00Z", "temperature": 21.0, "humidity": 50.0 },
                    { "timestamp": "2024-01-01T05:00:00Z", "temperature": 18.0, "relative_humidity": 70.0 }
                ]),
            )
            .respond(
                "/api/summary",
                json!({
                    "temperature_stats": { "mean": 18.5, "min": 16.0, "max": 21.0 },
                    "humidity_stats": { "mean": 55.0, "min": 40.0, "max": 70.0 },
                    "total_measurements": 100,
                    "violations_count": 2
                }),
            )
            .respond("/api/ai/insights", json!({ "insights": [] }))
            .respond("/api/ai/anomalies", json!({ "anomalies": [], "anomaly_rate": 0.0 }))
            .respond("/api/ai/predictions", json!({ "predictions": [] , "message": "Poucos dados" }))
            .respond("/api/ai/patterns", json!({ "violation_rate": 2.0, "total_measurements": 100 }))
            .respond(
                "/api/series",
                json!([
                    { "timestamp": "2024-01-01T03:00:00Z", "temperature": 18.0, "relative_humidity": 50.0 },
                    { "timestamp": "2024-01-01T04:00:00Z", "temperature": 21.0, "relative_humidity": 50.0 }
                ]),
            )
            .respond("/api/system/health", json!({ "status": "healthy", "checks": {} }))
    }

    fn outcome(seq: u64, violations: Result<Vec<Value>, String>) -> CycleOutcome {
        CycleOutcome {
            seq,
            period: Period::default(),
            facets: FacetSet::default(),
            violations,
        }
    }

    #[tokio::test]
    async fn test_refresh_renders_everything() {
        let mut dash = dashboard(backend());
        assert!(dash.refresh().await);

        let doc = dash.document();
        let table = doc.html(ids::VIOLATIONS_TABLE).unwrap();
        assert_eq!(table.matches("<tr").count(), 3);
        assert_eq!(doc.is_visible("temp-content"), Some(true));
        assert_eq!(doc.is_visible(ids::AI_CONTENT), Some(true));
        assert!(doc
            .html(ids::AI_PREDICTIONS_CONTENT)
            .unwrap()
            .contains("Poucos dados"));
        assert_eq!(doc.value(ids::VIOLATIONS_LIMIT), Some("10"));
        assert_eq!(dash.history().len(), 1);
        assert_eq!(dash.ai_status(), AiStatus::Active);
        // Timestamps shown at UTC-3
        assert!(table.contains("01/01/2024 00:00"));

        assert_eq!(dash.series().ready().map(Series::len), Some(2));
        assert_eq!(doc.is_visible(ids::SERIES_CONTENT), Some(true));
        assert_eq!(doc.is_visible(ids::SERIES_SKELETON), Some(false));
        assert_eq!(doc.html(ids::SERIES_CONTENT).unwrap().matches("<polyline").count(), 2);
        assert_eq!(dash.health(), ApiHealth::Healthy);
        assert!(doc.html(ids::HEALTH_BADGE).unwrap().contains("API saudável"));
    }

    #[tokio::test]
    async fn test_failed_series_and_health_leave_the_rest_intact() {
        let client = backend()
            .fail("/api/series", 502)
            .fail("/api/system/health", 503);
        let mut dash = dashboard(client);
        dash.refresh().await;

        assert!(dash.series().is_failed());
        assert_eq!(dash.health(), ApiHealth::Unreachable);
        assert_eq!(dash.ai_status(), AiStatus::Active);
        let doc = dash.document();
        assert!(doc.html(ids::SERIES_CONTENT).unwrap().contains("series-error"));
        assert!(doc.html(ids::HEALTH_BADGE).unwrap().contains("API inacessível"));
        assert_eq!(doc.html(ids::VIOLATIONS_TABLE).unwrap().matches("<tr").count(), 3);
    }

    #[tokio::test]
    async fn test_filter_narrows_without_touching_cache() {
        let mut dash = dashboard(backend());
        dash.refresh().await;

        dash.toggle_temperature();
        assert_eq!(dash.visible_records().len(), 1);
        assert_eq!(dash.records().len(), 3);
        let table = dash.document().html(ids::VIOLATIONS_TABLE).unwrap();
        assert_eq!(table.matches("<tr").count(), 1);
        assert!(table.contains("21.0°C"));
        assert_eq!(dash.document().is_checked(ids::FILTER_TEMP), Some(true));

        dash.toggle_humidity();
        assert_eq!(dash.visible_records().len(), 2);

        dash.set_toggles(FilterToggles::default());
        assert_eq!(dash.visible_records().len(), 3);
    }

    #[test]
    fn test_filter_with_nothing_matching_shows_placeholder() {
        let mut dash = dashboard(MockClient::new());
        dash.apply(outcome(
            1,
            Ok(vec![json!({ "timestamp": "x", "temperature": 18.0, "humidity": 50.0 })]),
        ));
        dash.toggle_humidity();
        assert_eq!(
            dash.document().html(ids::VIOLATIONS_TABLE),
            Some(render::violations::EMPTY_ROW)
        );
    }

    #[test]
    fn test_stale_outcomes_are_discarded() {
        let mut dash = dashboard(MockClient::new());
        let newer = vec![json!({ "temperature": 21.0, "humidity": 50.0 })];
        let older = vec![
            json!({ "temperature": 18.0, "humidity": 50.0 }),
            json!({ "temperature": 18.0, "humidity": 51.0 }),
        ];

        assert!(dash.apply(outcome(2, Ok(newer))));
        // The earlier cycle settles late
        assert!(!dash.apply(outcome(1, Ok(older.clone()))));
        assert!(!dash.apply(outcome(2, Ok(older))));

        assert_eq!(dash.applied_seq(), 2);
        assert_eq!(dash.records().len(), 1);
        assert_eq!(dash.records()[0].temperature, 21.0);
    }

    #[test]
    fn test_violations_error_keeps_cache() {
        let mut dash = dashboard(MockClient::new());
        dash.apply(outcome(1, Ok(vec![json!({ "temperature": 21.0, "humidity": 50.0 })])));
        dash.apply(outcome(2, Err("HTTP 500".to_string())));

        assert_eq!(dash.violations_error(), Some("HTTP 500"));
        assert_eq!(dash.records().len(), 1);
        assert!(dash
            .document()
            .html(ids::VIOLATIONS_TABLE)
            .unwrap()
            .contains("Erro ao carregar violações"));

        dash.apply(outcome(3, Ok(vec![])));
        assert_eq!(dash.violations_error(), None);
        assert!(dash.records().is_empty());
    }

    #[tokio::test]
    async fn test_failed_facets_do_not_block_render() {
        let client = backend().fail("/api/ai/anomalies", 503).fail("/api/summary", 500);
        let mut dash = dashboard(client);
        dash.refresh().await;

        assert_eq!(dash.ai_status(), AiStatus::Partial);
        assert!(dash.summary().is_failed());
        assert!(dash.history().is_empty());
        assert_eq!(
            dash.document().html(ids::VIOLATIONS_TABLE).unwrap().matches("<tr").count(),
            3
        );
        assert!(dash
            .document()
            .html(ids::AI_ANOMALIES_CONTENT)
            .unwrap()
            .contains("ai-error"));
        assert!(crate::data::facet_error(&dash.facets().anomalies).is_some());
        assert_eq!(dash.facets().failed_ai(), vec![Facet::Anomalies]);
    }

    #[tokio::test]
    async fn test_period_changes_reach_requests() {
        let client = Arc::new(backend());
        let config = ConfigStore::default();
        let fetcher = DataFetcher::from_config(client.clone(), &config);
        let mut dash = Dashboard::new(config, fetcher, HtmlDocument::dashboard());

        assert!(dash.set_limit(50));
        assert!(dash.set_days(7));
        assert!(!dash.set_limit(500));
        assert!(!dash.set_days(0));
        assert_eq!(dash.period().limit, 50);
        assert_eq!(dash.period().days, 7);
        assert_eq!(dash.config().get_u64("ui.violations_limit", 0), 50);

        dash.refresh().await;
        let calls = client.calls();
        assert!(calls.contains(&"/api/violations?days=7&limit=50".to_string()));
        assert!(calls.contains(&"/api/summary?days=7".to_string()));
        assert!(calls.contains(&"/api/series?days=7&max_points=500".to_string()));
    }

    #[test]
    fn test_limit_options_from_config() {
        let dash = dashboard(MockClient::new());
        assert_eq!(dash.limit_options(), vec![5, 10, 20, 50, 100]);
    }

    #[tokio::test]
    async fn test_export_page() {
        let mut dash = dashboard(backend());
        dash.refresh().await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.html");
        dash.export_page(&path).unwrap();

        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.contains(TITLE));
        assert!(page.contains("21.0°C"));
        assert!(page.contains("series-temperature"));
    }

    #[tokio::test]
    async fn test_records_json_follows_filter() {
        let mut dash = dashboard(backend());
        dash.refresh().await;
        dash.toggle_temperature();

        let exported: Value = serde_json::from_str(&dash.records_json().unwrap()).unwrap();
        assert_eq!(exported["filter"], "temperatura");
        assert_eq!(exported["total"], 3);
        assert_eq!(exported["period"]["days"], 30);
        let records = exported["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["temperature"], 21.0);
        assert_eq!(records[0]["status"], "Violation");
        assert_eq!(records[0]["temp_violation"], true);
        assert_eq!(records[0]["rh_violation"], false);
        assert_eq!(records[0]["timestamp"], "2024-01-01T04:00:00Z");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("violations.json");
        dash.export_records(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"records\""));
    }
}
