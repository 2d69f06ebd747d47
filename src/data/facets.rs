//! Typed views over backend facet payloads.
//!
//! Facet bodies are opaque JSON owned by the backend. Each panel reads only
//! the fields it displays and sorts the payload into one of three branches:
//! an error (sentinel or backend-reported), "not enough data" (the backend
//! answered with an empty collection and a `message`), or a ready summary.

use serde_json::Value;

/// A displayable facet in one of its three states.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel<T> {
    Ready(T),
    /// The backend had too little data; carries its explanation.
    Insufficient(String),
    /// The fetch failed or the backend reported an error.
    Failed(String),
}

impl<T> Panel<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Panel::Failed(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// The error message carried by a facet payload, if any.
///
/// Any `error` key counts, whatever its value, so that `{"error": null}`
/// still takes the negative branch.
pub fn facet_error(payload: &Value) -> Option<String> {
    let err = payload.as_object()?.get("error")?;
    Some(match err {
        Value::String(s) => s.clone(),
        Value::Null => "erro desconhecido".to_string(),
        other => other.to_string(),
    })
}

fn message(payload: &Value, fallback: &str) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

fn number(payload: &Value, key: &str) -> Option<f64> {
    payload.get(key).and_then(Value::as_f64)
}

fn text(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Anomaly detection results.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalySummary {
    pub count: usize,
    /// Percentage of measurements flagged.
    pub rate: f64,
    pub high_severity: usize,
    pub total_measurements: u64,
}

impl AnomalySummary {
    pub fn from_facet(payload: &Value) -> Panel<Self> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        let anomalies = payload
            .get("anomalies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if anomalies.is_empty() && payload.get("anomaly_rate").is_none() {
            return Panel::Insufficient(message(payload, "Sem dados de anomalias"));
        }

        let high_severity = anomalies
            .iter()
            .filter(|a| a.get("severity").and_then(Value::as_str) == Some("high"))
            .count();

        Panel::Ready(Self {
            count: anomalies.len(),
            rate: number(payload, "anomaly_rate").unwrap_or(0.0),
            high_severity,
            total_measurements: payload
                .get("total_measurements")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }
}

/// The first (nearest) prediction plus the trend directions.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSummary {
    pub temperature: f64,
    pub humidity: f64,
    /// Percentage, 0-100.
    pub violation_probability: f64,
    pub temperature_trend: Option<String>,
    pub humidity_trend: Option<String>,
}

impl PredictionSummary {
    pub fn from_facet(payload: &Value) -> Panel<Self> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        let Some(first) = payload
            .get("predictions")
            .and_then(Value::as_array)
            .and_then(|p| p.first())
        else {
            return Panel::Insufficient(message(payload, "Sem predições disponíveis"));
        };

        let trends = payload.get("trend_analysis");
        Panel::Ready(Self {
            temperature: number(first, "predicted_temperature").unwrap_or(0.0),
            humidity: number(first, "predicted_humidity").unwrap_or(0.0),
            violation_probability: number(first, "violation_probability").unwrap_or(0.0),
            temperature_trend: trends.and_then(|t| text(t, "temperature_trend")),
            humidity_trend: trends.and_then(|t| text(t, "humidity_trend")),
        })
    }
}

/// Temporal pattern analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub violation_rate: f64,
    pub total_measurements: u64,
    pub analysis_period: Option<String>,
}

impl PatternSummary {
    pub fn from_facet(payload: &Value) -> Panel<Self> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        if payload.get("violation_rate").is_none() && payload.get("total_measurements").is_none()
        {
            return Panel::Insufficient(message(payload, "Sem padrões identificados"));
        }

        Panel::Ready(Self {
            violation_rate: number(payload, "violation_rate").unwrap_or(0.0),
            total_measurements: payload
                .get("total_measurements")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            analysis_period: text(payload, "analysis_period"),
        })
    }
}

/// A single generated insight.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    /// `warning`, `info`, `trend`, ...
    pub kind: String,
    pub title: String,
    pub description: String,
    pub recommendation: Option<String>,
}

impl Insight {
    /// All insights in the payload. An empty list with no message is still
    /// ready (nothing noteworthy), not insufficient.
    pub fn from_facet(payload: &Value) -> Panel<Vec<Self>> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        let items = payload.get("insights").and_then(Value::as_array);
        match items {
            Some(items) if !items.is_empty() || payload.get("message").is_none() => {
                Panel::Ready(items.iter().filter_map(Self::from_value).collect())
            }
            _ => Panel::Insufficient(message(payload, "Sem insights disponíveis")),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        Some(Self {
            kind: text(value, "type").unwrap_or_else(|| "info".to_string()),
            title: text(value, "title").unwrap_or_default(),
            description: text(value, "description").unwrap_or_default(),
            recommendation: text(value, "recommendation"),
        })
    }
}

/// Aggregate KPIs for the period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryKpis {
    pub temperature_mean: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub humidity_mean: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
    pub total_measurements: u64,
    pub violations_count: u64,
}

impl SummaryKpis {
    pub fn from_facet(payload: &Value) -> Panel<Self> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        if !payload.is_object() {
            return Panel::Insufficient("Resumo indisponível".to_string());
        }

        let stat = |group: &str, key: &str| {
            payload.get(group).and_then(|g| g.get(key)).and_then(Value::as_f64)
        };
        Panel::Ready(Self {
            temperature_mean: stat("temperature_stats", "mean"),
            temperature_min: stat("temperature_stats", "min"),
            temperature_max: stat("temperature_stats", "max"),
            humidity_mean: stat("humidity_stats", "mean"),
            humidity_min: stat("humidity_stats", "min"),
            humidity_max: stat("humidity_stats", "max"),
            total_measurements: payload
                .get("total_measurements")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            violations_count: payload
                .get("violations_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }
}

/// Backend self-check from the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiHealth {
    Healthy,
    /// Reachable, but no recent measurements.
    Warning,
    /// Reachable, with a failing component.
    Unhealthy,
    /// The health request itself failed.
    Unreachable,
    /// Not fetched yet, or an unrecognized status.
    Unknown,
}

impl ApiHealth {
    pub fn from_facet(payload: &Value) -> Self {
        if facet_error(payload).is_some() {
            return ApiHealth::Unreachable;
        }
        match payload.get("status").and_then(Value::as_str) {
            Some("healthy") => ApiHealth::Healthy,
            Some("warning") => ApiHealth::Warning,
            Some("unhealthy") => ApiHealth::Unhealthy,
            _ => ApiHealth::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApiHealth::Healthy => "API saudável",
            ApiHealth::Warning => "API sem dados recentes",
            ApiHealth::Unhealthy => "API com falhas",
            ApiHealth::Unreachable => "API inacessível",
            ApiHealth::Unknown => "API desconhecida",
        }
    }

    /// Whether the dashboard should call attention to it.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ApiHealth::Warning | ApiHealth::Unhealthy | ApiHealth::Unreachable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_key_takes_negative_branch() {
        assert_eq!(
            AnomalySummary::from_facet(&json!({ "error": "timeout" })),
            Panel::Failed("timeout".to_string())
        );
        // Backend-reported errors look the same
        assert!(PatternSummary::from_facet(&json!({ "error": null })).is_failed());
        assert!(facet_error(&json!({ "anomalies": [] })).is_none());
        assert!(facet_error(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_anomalies_ready() {
        let panel = AnomalySummary::from_facet(&json!({
            "anomalies": [
                { "severity": "high" },
                { "severity": "medium" }
            ],
            "anomaly_rate": 4.0,
            "total_measurements": 50
        }));
        let summary = panel.ready().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.high_severity, 1);
        assert_eq!(summary.rate, 4.0);
        assert_eq!(summary.total_measurements, 50);
    }

    #[test]
    fn test_anomalies_insufficient_data() {
        let panel = AnomalySummary::from_facet(&json!({
            "anomalies": [],
            "total_measurements": 3,
            "message": "Dados insuficientes para detecção de anomalias"
        }));
        assert_eq!(
            panel,
            Panel::Insufficient("Dados insuficientes para detecção de anomalias".to_string())
        );
    }

    #[test]
    fn test_prediction_reads_first_entry() {
        let panel = PredictionSummary::from_facet(&json!({
            "predictions": [
                { "predicted_temperature": 18.4, "predicted_humidity": 61.0, "violation_probability": 50.0 },
                { "predicted_temperature": 30.0, "predicted_humidity": 90.0, "violation_probability": 100.0 }
            ],
            "trend_analysis": { "temperature_trend": "increasing", "humidity_trend": "decreasing" }
        }));
        let p = panel.ready().unwrap();
        assert_eq!(p.temperature, 18.4);
        assert_eq!(p.humidity, 61.0);
        assert_eq!(p.violation_probability, 50.0);
        assert_eq!(p.temperature_trend.as_deref(), Some("increasing"));
    }

    #[test]
    fn test_prediction_empty_is_insufficient() {
        let panel = PredictionSummary::from_facet(&json!({ "predictions": [] }));
        assert_eq!(panel, Panel::Insufficient("Sem predições disponíveis".to_string()));
    }

    #[test]
    fn test_patterns_ready() {
        let panel = PatternSummary::from_facet(&json!({
            "violation_rate": 12.5,
            "total_measurements": 800,
            "analysis_period": "30 dias"
        }));
        let p = panel.ready().unwrap();
        assert_eq!(p.violation_rate, 12.5);
        assert_eq!(p.total_measurements, 800);
    }

    #[test]
    fn test_insights_branches() {
        let ready = Insight::from_facet(&json!({
            "insights": [{ "type": "warning", "title": "Alta taxa", "description": "12%" }]
        }));
        let list = ready.ready().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, "warning");
        assert!(list[0].recommendation.is_none());

        let nothing_noteworthy = Insight::from_facet(&json!({ "insights": [] }));
        assert_eq!(nothing_noteworthy, Panel::Ready(vec![]));

        let too_little = Insight::from_facet(&json!({ "insights": [], "message": "poucos dados" }));
        assert_eq!(too_little, Panel::Insufficient("poucos dados".to_string()));
    }

    #[test]
    fn test_api_health() {
        assert_eq!(
            ApiHealth::from_facet(&json!({ "status": "healthy", "checks": {} })),
            ApiHealth::Healthy
        );
        let stale = ApiHealth::from_facet(&json!({
            "status": "warning",
            "checks": { "database_connection": "healthy", "recent_data_flow": "warning" }
        }));
        assert_eq!(stale, ApiHealth::Warning);
        assert!(stale.is_degraded());
        assert_eq!(
            ApiHealth::from_facet(&json!({ "error": "HTTP 404" })),
            ApiHealth::Unreachable
        );
        assert_eq!(ApiHealth::from_facet(&Value::Null), ApiHealth::Unknown);
        assert!(!ApiHealth::Unknown.is_degraded());
    }

    #[test]
    fn test_summary_kpis() {
        let panel = SummaryKpis::from_facet(&json!({
            "temperature_stats": { "mean": 18.25, "min": 16.9, "max": 20.1 },
            "humidity_stats": { "mean": 55.0, "min": null, "max": 63.2 },
            "total_measurements": 1440,
            "violations_count": 12
        }));
        let k = panel.ready().unwrap();
        assert_eq!(k.temperature_mean, Some(18.25));
        assert_eq!(k.humidity_min, None);
        assert_eq!(k.total_measurements, 1440);
        assert_eq!(k.violations_count, 12);
    }
}
