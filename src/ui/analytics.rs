//! Analytics view rendering.
//!
//! One panel per analytic facet, each in its ready, insufficient-data or
//! error state.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::common::block;
use crate::app::App;
use crate::data::format::{format_celsius, format_count, format_percent};
use crate::data::{AnomalySummary, Insight, Panel, PatternSummary, PredictionSummary};

fn trend_arrow(trend: Option<&str>) -> &'static str {
    match trend {
        Some("increasing") => "↑",
        Some("decreasing") => "↓",
        _ => "→",
    }
}

/// Lines for a panel, or its fallback message.
fn panel_lines<'a, T>(
    app: &App,
    panel: &Panel<T>,
    ready: impl FnOnce(&T) -> Vec<Line<'a>>,
) -> Vec<Line<'a>> {
    match panel {
        Panel::Ready(value) => ready(value),
        Panel::Insufficient(msg) => vec![Line::from(Span::styled(
            msg.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ))],
        Panel::Failed(msg) => vec![Line::from(Span::styled(
            format!("Erro: {}", msg),
            app.theme.flag_style(true),
        ))],
    }
}

/// Render the Analytics view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.dashboard.fetcher().ai_enabled() {
        frame.render_widget(
            Paragraph::new("Análise inteligente desativada na configuração")
                .block(block(app, " Análise ".to_string())),
            area,
        );
        return;
    }

    let facets = app.dashboard.facets();
    let rows = Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).split(area);
    let top = Layout::horizontal([Constraint::Fill(1); 3]).split(rows[0]);

    let anomalies = panel_lines(app, &AnomalySummary::from_facet(&facets.anomalies), |a| {
        vec![
            Line::from(format!("{} anomalias ({})", a.count, format_percent(a.rate))),
            Line::from(format!("{} de alta severidade", a.high_severity)),
            Line::from(format!("{} medições", format_count(a.total_measurements))),
        ]
    });
    let predictions =
        panel_lines(app, &PredictionSummary::from_facet(&facets.predictions), |p| {
            vec![
                Line::from(vec![
                    Span::raw("Temperatura "),
                    Span::styled(
                        format_celsius(p.temperature),
                        app.theme.flag_style(crate::data::temp_violation(p.temperature)),
                    ),
                    Span::raw(format!(" {}", trend_arrow(p.temperature_trend.as_deref()))),
                ]),
                Line::from(vec![
                    Span::raw("Umidade "),
                    Span::styled(
                        format_percent(p.humidity),
                        app.theme.flag_style(crate::data::rh_violation(p.humidity)),
                    ),
                    Span::raw(format!(" {}", trend_arrow(p.humidity_trend.as_deref()))),
                ]),
                Line::from(format!(
                    "Prob. de violação {}",
                    format_percent(p.violation_probability)
                )),
            ]
        });
    let patterns = panel_lines(app, &PatternSummary::from_facet(&facets.patterns), |p| {
        let mut lines = vec![
            Line::from(format!("Taxa de violações {}", format_percent(p.violation_rate))),
            Line::from(format!("{} medições", format_count(p.total_measurements))),
        ];
        if let Some(period) = &p.analysis_period {
            lines.push(Line::from(period.clone()));
        }
        lines
    });

    let hours = app.dashboard.period().hours;
    for (area, title, lines) in [
        (top[0], " Anomalias ".to_string(), anomalies),
        (top[1], format!(" Predições ({}h) ", hours), predictions),
        (top[2], " Padrões ".to_string(), patterns),
    ] {
        frame.render_widget(
            Paragraph::new(lines)
                .block(block(app, title))
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    let insights = panel_lines(app, &Insight::from_facet(&facets.insights), |items| {
        if items.is_empty() {
            return vec![Line::from("Nenhum insight relevante no período")];
        }
        let mut lines = Vec::new();
        for insight in items {
            let style = match insight.kind.as_str() {
                "warning" | "alert" => Style::default().fg(app.theme.warning),
                _ => Style::default().fg(app.theme.highlight),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("• {} ", insight.title), style.add_modifier(Modifier::BOLD)),
                Span::raw(insight.description.clone()),
            ]));
            if let Some(rec) = &insight.recommendation {
                lines.push(Line::from(Span::styled(
                    format!("  → {}", rec),
                    Style::default().add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines
    });
    let status = app.dashboard.ai_status();
    frame.render_widget(
        Paragraph::new(insights)
            .block(block(app, format!(" Insights │ {} ", status.label())))
            .wrap(Wrap { trim: true }),
        rows[1],
    );
}
