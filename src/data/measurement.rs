//! Measurement records and threshold classification.
//!
//! Records arrive from the violations endpoint as loosely shaped JSON. They
//! are normalized here: missing numbers become zero, the humidity field is
//! taken from the first non-null of `humidity`, `relative_humidity` or `rh`,
//! and anything that is not a JSON object is dropped.

use serde::Serialize;
use serde_json::{Map, Value};

/// Lowest acceptable temperature (°C), inclusive.
pub const TEMP_LOW: f64 = 17.0;
/// Highest acceptable temperature (°C), inclusive.
pub const TEMP_HIGH: f64 = 19.5;
/// Highest acceptable relative humidity (%), inclusive.
pub const RH_LIMIT: f64 = 62.0;

/// Field names that may carry relative humidity, in priority order.
const HUMIDITY_KEYS: [&str; 3] = ["humidity", "relative_humidity", "rh"];

/// True when a temperature falls outside `[TEMP_LOW, TEMP_HIGH]`.
pub fn temp_violation(temperature: f64) -> bool {
    temperature < TEMP_LOW || temperature > TEMP_HIGH
}

/// True when humidity exceeds `RH_LIMIT`.
pub fn rh_violation(humidity: f64) -> bool {
    humidity > RH_LIMIT
}

/// Overall classification of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RecordStatus {
    Normal,
    Violation,
}

impl RecordStatus {
    /// Display label (pt-BR, as shown on the dashboard).
    pub fn label(&self) -> &'static str {
        match self {
            RecordStatus::Normal => "Normal",
            RecordStatus::Violation => "Violação",
        }
    }

    pub fn from_flag(violation: bool) -> Self {
        if violation {
            RecordStatus::Violation
        } else {
            RecordStatus::Normal
        }
    }
}

/// One temperature/humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Raw timestamp string as sent by the backend.
    pub timestamp: Option<String>,
    /// Temperature in °C; zero when absent.
    pub temperature: f64,
    /// Relative humidity in %; zero when absent.
    pub humidity: f64,
    /// Backend-supplied violation reason.
    pub reason: Option<String>,
}

impl Measurement {
    pub fn new(timestamp: &str, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            temperature,
            humidity,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Normalize a JSON entry. Returns `None` for anything but an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let timestamp = timestamp_field(obj);
        let temperature = obj.get("temperature").map_or(0.0, number_or_zero);
        let humidity = humidity_field(obj).map_or(0.0, number_or_zero);

        let reason = obj
            .get("reason")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Some(Self {
            timestamp,
            temperature,
            humidity,
            reason,
        })
    }

    pub fn temp_violation(&self) -> bool {
        temp_violation(self.temperature)
    }

    pub fn rh_violation(&self) -> bool {
        rh_violation(self.humidity)
    }

    /// A record the backend already explained is a violation regardless of
    /// the computed thresholds.
    pub fn has_reason(&self) -> bool {
        self.reason.is_some()
    }

    pub fn is_violation(&self) -> bool {
        self.has_reason() || self.temp_violation() || self.rh_violation()
    }

    pub fn status(&self) -> RecordStatus {
        RecordStatus::from_flag(self.is_violation())
    }
}

/// Normalize a list of raw entries, silently skipping malformed ones.
pub fn parse_records(values: &[Value]) -> Vec<Measurement> {
    values.iter().filter_map(Measurement::from_value).collect()
}

/// The `timestamp` field as text; non-string values are stringified.
pub(crate) fn timestamp_field(obj: &Map<String, Value>) -> Option<String> {
    obj.get("timestamp").and_then(|t| match t {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// First non-null humidity field, in [`HUMIDITY_KEYS`] order.
pub(crate) fn humidity_field(obj: &Map<String, Value>) -> Option<&Value> {
    HUMIDITY_KEYS
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

/// A numeric reading, accepting numbers and numeric strings.
pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_or_zero(value: &Value) -> f64 {
    number(value).unwrap_or(0.0)
}
