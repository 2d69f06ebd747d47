//! Data models and processing for backend responses.
//!
//! This module turns raw JSON from the monitoring API into classified,
//! display-ready values.
//!
//! ## Submodules
//!
//! - [`measurement`]: Violation records ([`Measurement`]) and the fixed
//!   temperature/humidity thresholds
//! - [`facets`]: Typed panels over the analytic facets (anomalies,
//!   predictions, patterns, insights, summary)
//! - [`format`]: Localized timestamps and numeric formatting
//! - [`history`]: Per-cycle KPI history for sparklines
//! - [`series`]: Backend time series for the trend charts
//!
//! ## Data Flow
//!
//! ```text
//! violations JSON ──▶ parse_records() ──────▶ Measurement (temp/rh flags)
//!                                                  │
//! facet JSON ──▶ *::from_facet() ──▶ Panel<T> ─────┤
//! series JSON ─▶ Series::from_facet() ─▶ Panel ────┤
//!                                                  ▼
//!                                              renderers
//! ```

pub mod facets;
pub mod format;
pub mod history;
pub mod measurement;
pub mod series;

pub use facets::{
    facet_error, AnomalySummary, ApiHealth, Insight, Panel, PatternSummary, PredictionSummary,
    SummaryKpis,
};
pub use history::History;
pub use measurement::{
    parse_records, rh_violation, temp_violation, Measurement, RecordStatus, RH_LIMIT, TEMP_HIGH,
    TEMP_LOW,
};
pub use series::{Series, SeriesPoint};
