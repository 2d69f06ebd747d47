//! Temperature/humidity time series for the trend charts.
//!
//! The series endpoint answers with a plain array of points ordered by
//! time. A point may lack either reading; charts leave a gap there instead
//! of plotting a zero.

use serde_json::Value;

use super::facets::{facet_error, Panel};
use super::measurement::{humidity_field, number, rh_violation, temp_violation, timestamp_field};

/// One sample of the series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl SeriesPoint {
    /// Returns `None` for anything but a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            timestamp: timestamp_field(obj),
            temperature: obj.get("temperature").and_then(number),
            humidity: humidity_field(obj).and_then(number),
        })
    }

    /// True when either reading is outside its threshold.
    pub fn is_violation(&self) -> bool {
        self.temperature.is_some_and(temp_violation) || self.humidity.is_some_and(rh_violation)
    }
}

/// The points of one period, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn from_facet(payload: &Value) -> Panel<Self> {
        if let Some(err) = facet_error(payload) {
            return Panel::Failed(err);
        }
        let Some(items) = payload.as_array() else {
            return Panel::Insufficient("Série temporal indisponível".to_string());
        };
        let points: Vec<SeriesPoint> = items.iter().filter_map(SeriesPoint::from_value).collect();
        if points.is_empty() {
            return Panel::Insufficient("Sem medições no período".to_string());
        }
        Panel::Ready(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(index, °C)` pairs for plotting. Points without a temperature are
    /// left out.
    pub fn temperature_points(&self) -> Vec<(f64, f64)> {
        self.indexed(|p| p.temperature)
    }

    /// `(index, %)` pairs for plotting.
    pub fn humidity_points(&self) -> Vec<(f64, f64)> {
        self.indexed(|p| p.humidity)
    }

    /// Lowest and highest temperature present.
    pub fn temperature_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().filter_map(|p| p.temperature))
    }

    pub fn humidity_bounds(&self) -> Option<(f64, f64)> {
        bounds(self.points.iter().filter_map(|p| p.humidity))
    }

    /// Number of points outside the thresholds.
    pub fn violation_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_violation()).count()
    }

    pub fn first_timestamp(&self) -> Option<&str> {
        self.points.first().and_then(|p| p.timestamp.as_deref())
    }

    pub fn last_timestamp(&self) -> Option<&str> {
        self.points.last().and_then(|p| p.timestamp.as_deref())
    }

    fn indexed(&self, reading: impl Fn(&SeriesPoint) -> Option<f64>) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| reading(p).map(|v| (i as f64, v)))
            .collect()
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ready_series() {
        let panel = Series::from_facet(&json!([
            { "timestamp": "2024-01-01T00:00:00-03:00", "temperature": 18.0, "relative_humidity": 55.0 },
            { "timestamp": "2024-01-01T00:05:00-03:00", "temperature": 20.1, "relative_humidity": null },
            { "timestamp": "2024-01-01T00:10:00-03:00", "temperature": null, "relative_humidity": 64.2 }
        ]));
        let series = panel.ready().unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.temperature_points(), vec![(0.0, 18.0), (1.0, 20.1)]);
        assert_eq!(series.humidity_points(), vec![(0.0, 55.0), (2.0, 64.2)]);
        assert_eq!(series.temperature_bounds(), Some((18.0, 20.1)));
        assert_eq!(series.humidity_bounds(), Some((55.0, 64.2)));
        assert_eq!(series.violation_count(), 2);
        assert_eq!(series.first_timestamp(), Some("2024-01-01T00:00:00-03:00"));
        assert_eq!(series.last_timestamp(), Some("2024-01-01T00:10:00-03:00"));
    }

    #[test]
    fn test_humidity_keys_follow_record_priority() {
        let point = SeriesPoint::from_value(&json!({
            "humidity": null, "relative_humidity": 61.0, "rh": 90.0
        }))
        .unwrap();
        assert_eq!(point.humidity, Some(61.0));
        // A missing reading stays missing
        assert_eq!(point.temperature, None);
        assert!(!point.is_violation());
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        assert_eq!(
            Series::from_facet(&json!([])),
            Panel::Insufficient("Sem medições no período".to_string())
        );
        // Malformed entries only
        assert!(matches!(
            Series::from_facet(&json!([null, 3, "x"])),
            Panel::Insufficient(_)
        ));
    }

    #[test]
    fn test_failed_series() {
        assert_eq!(
            Series::from_facet(&json!({ "error": "HTTP 502" })),
            Panel::Failed("HTTP 502".to_string())
        );
        assert!(matches!(Series::from_facet(&Value::Null), Panel::Insufficient(_)));
    }
}
