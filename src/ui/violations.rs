//! Violations view rendering.
//!
//! The filtered violation table, sharing its row model with the HTML
//! renderer.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::block;
use crate::app::App;
use crate::render::ViolationRow;

fn checkbox(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Render the Violations view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let toggles = app.dashboard.toggles();
    let period = app.dashboard.period();
    let rows: Vec<ViolationRow> = app.dashboard.rows();

    let position_info = if rows.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", app.selected_row.min(rows.len() - 1) + 1, rows.len())
    };
    let title = format!(
        " Violações ({} de {}) {} temp {} umidade │ limite {} │ {} dias{} ",
        rows.len(),
        app.dashboard.records().len(),
        checkbox(toggles.temperature),
        checkbox(toggles.humidity),
        period.limit,
        period.days,
        position_info
    );

    if let Some(err) = app.dashboard.violations_error() {
        if app.dashboard.records().is_empty() {
            let paragraph = Paragraph::new(Span::styled(
                format!("Erro ao carregar violações: {}", err),
                app.theme.flag_style(true),
            ))
            .block(block(app, title));
            frame.render_widget(paragraph, area);
            return;
        }
    }

    if rows.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "Nenhuma violação encontrada",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block(app, title));
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Data/Hora"),
        Cell::from("Temperatura"),
        Cell::from("Umidade"),
        Cell::from("Status"),
        Cell::from("Motivo"),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.timestamp.clone()),
                Cell::from(r.temperature.clone()).style(app.theme.flag_style(r.temp_violation)),
                Cell::from(r.humidity.clone()).style(app.theme.flag_style(r.rh_violation)),
                Cell::from(r.status.label()).style(app.theme.status_style(r.status)),
                Cell::from(r.reason.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(17),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Fill(1),
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block(app, title))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_row.min(rows.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
}
