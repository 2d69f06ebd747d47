//! Violation table rendering.

use chrono::FixedOffset;
use serde_json::Value;

use super::document::{escape, ids, write_html, Document};
use crate::data::format::{format_celsius, format_percent, format_timestamp};
use crate::data::{parse_records, Measurement, RecordStatus};
use crate::filter::FilterToggles;

/// Markup shown when there is nothing to list.
pub const EMPTY_ROW: &str =
    r#"<tr><td colspan="5" class="text-center text-muted">Nenhuma violação encontrada</td></tr>"#;

/// Display-ready view of one record, shared by the HTML and terminal views.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationRow {
    pub timestamp: String,
    pub temperature: String,
    pub humidity: String,
    pub temp_violation: bool,
    pub rh_violation: bool,
    pub status: RecordStatus,
    pub reason: Option<String>,
}

impl ViolationRow {
    pub fn from_record(record: &Measurement, offset: FixedOffset) -> Self {
        Self {
            timestamp: format_timestamp(record.timestamp.as_deref(), offset),
            temperature: format_celsius(record.temperature),
            humidity: format_percent(record.humidity),
            temp_violation: record.temp_violation(),
            rh_violation: record.rh_violation(),
            status: record.status(),
            reason: record.reason.clone(),
        }
    }

    /// Table row markup.
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<tr class="{row}">"#,
                "<td>{ts}</td>",
                r#"<td><span class="badge {tb}">{t}</span></td>"#,
                r#"<td><span class="badge {hb}">{h}</span></td>"#,
                r#"<td><span class="badge {sb}">{s}</span></td>"#,
                "<td>{reason}</td>",
                "</tr>"
            ),
            row = match self.status {
                RecordStatus::Violation => "violation-row",
                RecordStatus::Normal => "normal-row",
            },
            ts = escape(&self.timestamp),
            tb = badge_class(self.temp_violation),
            t = escape(&self.temperature),
            hb = badge_class(self.rh_violation),
            h = escape(&self.humidity),
            sb = badge_class(self.status == RecordStatus::Violation),
            s = self.status.label(),
            reason = self.reason.as_deref().map(escape).unwrap_or_else(|| "-".to_string()),
        )
    }
}

fn badge_class(violation: bool) -> &'static str {
    if violation {
        "bg-danger"
    } else {
        "bg-success"
    }
}

/// Build rows for a record list.
pub fn rows(records: &[Measurement], offset: FixedOffset) -> Vec<ViolationRow> {
    records.iter().map(|r| ViolationRow::from_record(r, offset)).collect()
}

/// Rewrite the violations table. `None` and an empty slice both render the
/// placeholder row.
pub fn render_table(doc: &mut dyn Document, records: Option<&[Measurement]>, offset: FixedOffset) {
    let markup = match records {
        Some(records) if !records.is_empty() => {
            rows(records, offset).iter().map(ViolationRow::to_html).collect::<String>()
        }
        _ => EMPTY_ROW.to_string(),
    };
    write_html(doc, ids::VIOLATIONS_TABLE, &markup);
}

/// Same as [`render_table`] but straight from JSON; malformed entries are
/// skipped.
pub fn render_raw(doc: &mut dyn Document, entries: Option<&[Value]>, offset: FixedOffset) {
    let records = entries.map(parse_records);
    render_table(doc, records.as_deref(), offset);
}

/// Replace the table with an error row.
pub fn render_error(doc: &mut dyn Document, message: &str) {
    let markup = format!(
        r#"<tr><td colspan="5" class="text-center text-danger">Erro ao carregar violações: {}</td></tr>"#,
        escape(message)
    );
    write_html(doc, ids::VIOLATIONS_TABLE, &markup);
}

/// Mirror the filter checkboxes and limit selector.
pub fn render_controls(doc: &mut dyn Document, toggles: FilterToggles, limit: u32) {
    for (id, checked) in [
        (ids::FILTER_TEMP, toggles.temperature),
        (ids::FILTER_HUMIDITY, toggles.humidity),
    ] {
        if !doc.set_checked(id, checked) {
            tracing::warn!("Render target #{} not found", id);
        }
    }
    if !doc.set_value(ids::VIOLATIONS_LIMIT, &limit.to_string()) {
        tracing::warn!("Render target #{} not found", ids::VIOLATIONS_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::format::display_offset;
    use crate::render::HtmlDocument;
    use serde_json::json;

    fn utc() -> FixedOffset {
        display_offset(0)
    }

    #[test]
    fn test_empty_and_absent_render_placeholder() {
        let mut doc = HtmlDocument::dashboard();
        let empty: &[Measurement] = &[];
        render_table(&mut doc, Some(empty), utc());
        assert_eq!(doc.html(ids::VIOLATIONS_TABLE), Some(EMPTY_ROW));

        doc.set_html(ids::VIOLATIONS_TABLE, "stale");
        render_table(&mut doc, None, utc());
        assert_eq!(doc.html(ids::VIOLATIONS_TABLE), Some(EMPTY_ROW));
    }

    #[test]
    fn test_hot_record_row() {
        let mut doc = HtmlDocument::dashboard();
        let entries = vec![json!({
            "timestamp": "2024-01-01T00:00:00Z",
            "temperature": 20.0,
            "humidity": 50
        })];
        render_raw(&mut doc, Some(entries.as_slice()), utc());

        let html = doc.html(ids::VIOLATIONS_TABLE).unwrap();
        assert!(html.contains("<td>01/01/2024 00:00</td>"));
        assert!(html.contains(r#"<span class="badge bg-danger">20.0°C</span>"#));
        assert!(html.contains(r#"<span class="badge bg-success">50.0%</span>"#));
        assert!(html.contains(r#"<span class="badge bg-danger">Violação</span>"#));
        assert!(html.starts_with(r#"<tr class="violation-row">"#));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mut doc = HtmlDocument::dashboard();
        let entries = vec![json!(null), json!({ "temperature": 18.0, "humidity": 55.0 }), json!(7)];
        render_raw(&mut doc, Some(entries.as_slice()), utc());

        let html = doc.html(ids::VIOLATIONS_TABLE).unwrap();
        assert_eq!(html.matches("<tr").count(), 1);
        assert!(html.contains("Normal"));
        assert!(html.contains("<td>-</td>"));
    }

    #[test]
    fn test_only_malformed_entries_render_placeholder() {
        let mut doc = HtmlDocument::dashboard();
        let entries = vec![json!(null)];
        render_raw(&mut doc, Some(entries.as_slice()), utc());
        assert_eq!(doc.html(ids::VIOLATIONS_TABLE), Some(EMPTY_ROW));
    }

    #[test]
    fn test_reason_is_escaped_and_forces_violation() {
        let record = Measurement::new("2024-01-01T00:00:00Z", 18.0, 50.0).with_reason("<script>");
        let row = ViolationRow::from_record(&record, utc());
        assert_eq!(row.status, RecordStatus::Violation);
        let html = row.to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_error_row_and_controls() {
        let mut doc = HtmlDocument::dashboard();
        render_error(&mut doc, "HTTP 500");
        assert!(doc.html(ids::VIOLATIONS_TABLE).unwrap().contains("HTTP 500"));

        render_controls(&mut doc, FilterToggles::new(true, false), 20);
        assert_eq!(doc.is_checked(ids::FILTER_TEMP), Some(true));
        assert_eq!(doc.is_checked(ids::FILTER_HUMIDITY), Some(false));
        assert_eq!(doc.value(ids::VIOLATIONS_LIMIT), Some("20"));
    }
}
