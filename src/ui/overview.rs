//! Overview rendering.
//!
//! Four KPI cards across the top, the period's time series charted below
//! them, then trend sparklines and the analytics status.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::common::block;
use super::render_sparkline;
use crate::app::App;
use crate::data::format::{format_celsius, format_count, format_optional, format_percent};
use crate::data::{rh_violation, temp_violation, Panel, Series, RH_LIMIT, TEMP_HIGH, TEMP_LOW};

/// Render the Overview.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([
        Constraint::Length(5),
        Constraint::Min(8),
        Constraint::Length(8),
    ])
    .split(area);
    render_cards(frame, app, rows[0]);
    render_series(frame, app, rows[1]);
    render_trends(frame, app, rows[2]);
}

fn card(frame: &mut Frame, app: &App, area: Rect, title: &str, value: Span, detail: String) {
    let text = vec![
        Line::from(value),
        Line::from(Span::styled(detail, Style::default().add_modifier(Modifier::DIM))),
    ];
    frame.render_widget(
        Paragraph::new(text).block(block(app, format!(" {} ", title))),
        area,
    );
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::horizontal([Constraint::Fill(1); 4]).split(area);
    let bold = |style: Style| style.add_modifier(Modifier::BOLD);

    let kpis = match app.dashboard.summary() {
        Panel::Ready(kpis) => kpis,
        Panel::Insufficient(msg) | Panel::Failed(msg) => {
            let text = if app.dashboard.applied_seq() == 0 {
                "Carregando...".to_string()
            } else {
                msg
            };
            for (i, title) in ["Temperatura", "Umidade", "Medições", "Violações"]
                .iter()
                .enumerate()
            {
                card(frame, app, cols[i], title, Span::raw("-"), text.clone());
            }
            return;
        }
    };

    card(
        frame,
        app,
        cols[0],
        "Temperatura",
        Span::styled(
            format_optional(kpis.temperature_mean, format_celsius),
            bold(app.theme.flag_style(kpis.temperature_mean.is_some_and(temp_violation))),
        ),
        format!(
            "mín {} / máx {}",
            format_optional(kpis.temperature_min, format_celsius),
            format_optional(kpis.temperature_max, format_celsius)
        ),
    );
    card(
        frame,
        app,
        cols[1],
        "Umidade",
        Span::styled(
            format_optional(kpis.humidity_mean, format_percent),
            bold(app.theme.flag_style(kpis.humidity_mean.is_some_and(rh_violation))),
        ),
        format!(
            "mín {} / máx {}",
            format_optional(kpis.humidity_min, format_percent),
            format_optional(kpis.humidity_max, format_percent)
        ),
    );
    card(
        frame,
        app,
        cols[2],
        "Medições",
        Span::styled(
            format_count(kpis.total_measurements),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        format!("últimos {} dias", app.dashboard.period().days),
    );

    let delta = match app.dashboard.history().violations_delta() {
        Some(d) if d > 0 => format!(" (+{})", d),
        Some(d) if d < 0 => format!(" ({})", d),
        _ => String::new(),
    };
    card(
        frame,
        app,
        cols[3],
        "Violações",
        Span::styled(
            format!("{}{}", format_count(kpis.violations_count), delta),
            bold(app.theme.flag_style(kpis.violations_count > 0)),
        ),
        if kpis.total_measurements > 0 {
            format!(
                "{} das medições",
                format_percent(
                    kpis.violations_count as f64 / kpis.total_measurements as f64 * 100.0
                )
            )
        } else {
            "sem medições".to_string()
        },
    );
}

fn render_series(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = match app.dashboard.series() {
        Panel::Ready(series) => return render_charts(frame, app, area, &series),
        _ if app.dashboard.applied_seq() == 0 => ("Carregando...".to_string(), Style::default()),
        Panel::Failed(err) => (
            format!("Erro ao carregar série temporal: {}", err),
            Style::default().fg(app.theme.warning),
        ),
        Panel::Insufficient(msg) => (msg, Style::default().add_modifier(Modifier::DIM)),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(text, style))
            .block(block(app, " Série temporal ".to_string())),
        area,
    );
}

fn render_charts(frame: &mut Frame, app: &App, area: Rect, series: &Series) {
    let cols = Layout::horizontal([Constraint::Fill(1); 2]).split(area);
    let count = series.len();
    series_chart(
        frame,
        app,
        cols[0],
        format!(" Temperatura · {} pontos ", format_count(count as u64)),
        &series.temperature_points(),
        count,
        series.temperature_bounds(),
        &[TEMP_LOW, TEMP_HIGH],
        format_celsius,
    );
    series_chart(
        frame,
        app,
        cols[1],
        format!(" Umidade · {} fora dos limites ", format_count(series.violation_count() as u64)),
        &series.humidity_points(),
        count,
        series.humidity_bounds(),
        &[RH_LIMIT],
        format_percent,
    );
}

/// Y range covering the readings and every threshold, with a little padding.
fn chart_bounds(bounds: (f64, f64), limits: &[f64]) -> [f64; 2] {
    let (lo, hi) = limits
        .iter()
        .fold(bounds, |(lo, hi), &l| (lo.min(l), hi.max(l)));
    let pad = ((hi - lo) * 0.05).max(0.5);
    [lo - pad, hi + pad]
}

/// Horizontal segments across `[0, x_max]`, one per threshold.
fn limit_lines(limits: &[f64], x_max: f64) -> Vec<[(f64, f64); 2]> {
    limits.iter().map(|&l| [(0.0, l), (x_max, l)]).collect()
}

#[allow(clippy::too_many_arguments)]
fn series_chart(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    title: String,
    points: &[(f64, f64)],
    count: usize,
    bounds: Option<(f64, f64)>,
    limits: &[f64],
    format: fn(f64) -> String,
) {
    let Some(bounds) = bounds else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Sem leituras",
                Style::default().add_modifier(Modifier::DIM),
            ))
            .block(block(app, title)),
            area,
        );
        return;
    };

    let x_max = count.saturating_sub(1).max(1) as f64;
    let [lo, hi] = chart_bounds(bounds, limits);
    let lines = limit_lines(limits, x_max);

    let mut datasets: Vec<Dataset> = lines
        .iter()
        .map(|line| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(app.theme.warning))
                .data(line)
        })
        .collect();
    datasets.push(
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(app.theme.highlight))
            .data(points),
    );

    let dim = Style::default().add_modifier(Modifier::DIM);
    let chart = Chart::new(datasets)
        .block(block(app, title))
        .x_axis(Axis::default().bounds([0.0, x_max]).style(dim))
        .y_axis(
            Axis::default()
                .bounds([lo, hi])
                .style(dim)
                .labels(vec![Span::raw(format(bounds.0)), Span::raw(format(bounds.1))]),
        );
    frame.render_widget(chart, area);
}

fn render_trends(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.dashboard.history();
    let ai = app.dashboard.ai_status();
    let failed: Vec<&str> = app
        .dashboard
        .facets()
        .failed_ai()
        .iter()
        .map(|f| f.label())
        .collect();

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Temperatura  "),
            Span::styled(
                render_sparkline(&history.temperature_sparkline()),
                Style::default().fg(app.theme.highlight),
            ),
        ]),
        Line::from(vec![
            Span::raw("Umidade      "),
            Span::styled(
                render_sparkline(&history.humidity_sparkline()),
                Style::default().fg(app.theme.highlight),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "Limites: temperatura {:.1}-{:.1}°C, umidade até {:.1}%",
                TEMP_LOW, TEMP_HIGH, RH_LIMIT
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(vec![
            Span::raw("Análise inteligente: "),
            Span::styled(ai.label(), app.theme.ai_style(ai)),
        ]),
    ];
    if !failed.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Indisponível: {}", failed.join(", ")),
            Style::default().fg(app.theme.warning),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block(
            app,
            format!(" Tendência ({} ciclos) ", history.len()),
        )),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::dashboard::Dashboard;
    use crate::notify::StatusLine;
    use crate::source::mock::MockClient;
    use crate::source::{error_sentinel, CycleOutcome, FacetSet, Period};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;
    use std::sync::Arc;

    fn app_with(facets: FacetSet) -> App {
        let mut dashboard =
            Dashboard::from_config(ConfigStore::default(), Arc::new(MockClient::new()));
        dashboard.apply(CycleOutcome {
            seq: 1,
            period: Period::default(),
            facets,
            violations: Ok(vec![]),
        });
        App::new(dashboard, None, StatusLine::new())
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app, frame.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_chart_bounds_include_limits() {
        assert_eq!(chart_bounds((18.0, 19.0), &[17.0, 19.5]), [16.5, 20.0]);
        let [lo, hi] = chart_bounds((50.0, 80.0), &[62.0]);
        assert!(lo < 50.0 && hi > 80.0);
        assert_eq!(limit_lines(&[62.0], 9.0), vec![[(0.0, 62.0), (9.0, 62.0)]]);
    }

    #[test]
    fn test_series_charts_drawn() {
        let app = app_with(FacetSet {
            series: json!([
                { "timestamp": "2024-01-01T03:00:00Z", "temperature": 18.0, "relative_humidity": 55.0 },
                { "timestamp": "2024-01-01T04:00:00Z", "temperature": 21.0, "relative_humidity": 65.0 }
            ]),
            ..FacetSet::default()
        });
        let screen = draw(&app);
        assert!(screen.contains("Temperatura · 2 pontos"));
        assert!(screen.contains("Umidade · 1 fora dos limites"));
    }

    #[test]
    fn test_series_messages() {
        let empty = app_with(FacetSet {
            series: json!([]),
            ..FacetSet::default()
        });
        assert!(draw(&empty).contains("Sem medições no período"));

        let failed = app_with(FacetSet {
            series: error_sentinel("HTTP 502"),
            ..FacetSet::default()
        });
        assert!(draw(&failed).contains("Erro ao carregar série temporal: HTTP 502"));
    }
}
