//! Trend charts for the series facet.
//!
//! Each dimension is drawn as an inline SVG polyline, scaled to its own
//! range widened to include the threshold lines, so the band is always in
//! view.

use chrono::FixedOffset;

use super::document::{escape, ids, reveal, write_html, Document};
use crate::data::format::{format_celsius, format_count, format_percent, format_timestamp};
use crate::data::{Panel, Series, RH_LIMIT, TEMP_HIGH, TEMP_LOW};

const WIDTH: f64 = 600.0;
const HEIGHT: f64 = 160.0;

/// Map `(index, value)` pairs into the chart box.
fn scale(points: &[(f64, f64)], count: usize, lo: f64, hi: f64) -> Vec<(f64, f64)> {
    let span = (hi - lo).max(f64::EPSILON);
    let x_step = if count > 1 {
        WIDTH / (count - 1) as f64
    } else {
        0.0
    };
    points
        .iter()
        .map(|&(i, v)| {
            let x = if count > 1 { i * x_step } else { WIDTH / 2.0 };
            let y = HEIGHT - (v - lo) / span * HEIGHT;
            (x, y.clamp(0.0, HEIGHT))
        })
        .collect()
}

/// One dimension as an SVG chart with dashed threshold lines.
fn chart(
    class: &str,
    points: &[(f64, f64)],
    count: usize,
    bounds: (f64, f64),
    limits: &[f64],
) -> String {
    let (lo, hi) = bounds;
    let pad = ((hi - lo) * 0.05).max(0.5);
    let (lo, hi) = (lo - pad, hi + pad);

    let mut svg = format!(
        r#"<svg class="series-chart {}" viewBox="0 0 {} {}" preserveAspectRatio="none">"#,
        class, WIDTH, HEIGHT
    );
    for &limit in limits {
        let y = scale(&[(0.0, limit)], 2, lo, hi)[0].1;
        svg.push_str(&format!(
            r#"<line class="series-limit" x1="0" y1="{y:.1}" x2="{w}" y2="{y:.1}"/>"#,
            y = y,
            w = WIDTH
        ));
    }
    let coords: Vec<String> = scale(points, count, lo, hi)
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect();
    svg.push_str(&format!(
        r#"<polyline class="series-line" points="{}"/>"#,
        coords.join(" ")
    ));
    svg.push_str("</svg>");
    svg
}

fn widen(bounds: (f64, f64), limits: &[f64]) -> (f64, f64) {
    limits
        .iter()
        .fold(bounds, |(lo, hi), &l| (lo.min(l), hi.max(l)))
}

fn dimension(
    heading: &str,
    class: &str,
    points: &[(f64, f64)],
    count: usize,
    bounds: Option<(f64, f64)>,
    limits: &[f64],
    format: fn(f64) -> String,
) -> String {
    let Some(bounds) = bounds else {
        return format!(
            r#"<div class="series-dimension"><h3>{}</h3><div class="series-empty text-muted">Sem leituras</div></div>"#,
            heading
        );
    };
    format!(
        r#"<div class="series-dimension"><h3>{}</h3>{}<div class="series-range">mín {} / máx {}</div></div>"#,
        heading,
        chart(class, points, count, widen(bounds, limits), limits),
        escape(&format(bounds.0)),
        escape(&format(bounds.1))
    )
}

/// Markup for the series panel in each of its branches.
pub fn series_markup(panel: &Panel<Series>, offset: FixedOffset) -> String {
    match panel {
        Panel::Ready(series) => {
            let count = series.len();
            let mut out = dimension(
                "Temperatura",
                "series-temperature",
                &series.temperature_points(),
                count,
                series.temperature_bounds(),
                &[TEMP_LOW, TEMP_HIGH],
                format_celsius,
            );
            out.push_str(&dimension(
                "Umidade",
                "series-humidity",
                &series.humidity_points(),
                count,
                series.humidity_bounds(),
                &[RH_LIMIT],
                format_percent,
            ));
            out.push_str(&format!(
                r#"<div class="series-caption text-muted">{} pontos de {} a {} · {} fora dos limites</div>"#,
                format_count(count as u64),
                escape(&format_timestamp(series.first_timestamp(), offset)),
                escape(&format_timestamp(series.last_timestamp(), offset)),
                format_count(series.violation_count() as u64)
            ));
            out
        }
        Panel::Insufficient(message) => format!(
            r#"<div class="series-empty text-muted">{}</div>"#,
            escape(message)
        ),
        Panel::Failed(message) => format!(
            r#"<div class="series-error text-danger">Erro ao carregar série temporal: {}</div>"#,
            escape(message)
        ),
    }
}

/// Rewrite the trend charts and swap their skeleton for content.
pub fn render_series(doc: &mut dyn Document, panel: &Panel<Series>, offset: FixedOffset) {
    write_html(doc, ids::SERIES_CONTENT, &series_markup(panel, offset));
    reveal(doc, ids::SERIES);
}
