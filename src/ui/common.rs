//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::format::{format_celsius, format_count, format_optional, format_percent};
use crate::data::Panel;

/// Render the header bar with the period's headline numbers.
///
/// Displays: status indicator, environment, mean readings, violation count
/// and the backend health check.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let env = app.dashboard.config().environment();
    let title = Span::styled(" ENVWATCH ", Style::default().add_modifier(Modifier::BOLD));
    let health = app.dashboard.health();
    let health = Span::styled(
        format!(" │ {}", health.label()),
        app.theme.flag_style(health.is_degraded()),
    );

    let kpis = match app.dashboard.summary() {
        Panel::Ready(kpis) => kpis,
        Panel::Failed(err) if app.dashboard.applied_seq() > 0 => {
            let line = Line::from(vec![
                Span::styled(" ● ", app.theme.flag_style(true)),
                title,
                Span::raw(format!("│ {} │ Resumo indisponível: {}", env, err)),
                health,
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
        _ => {
            let line = Line::from(vec![title, Span::raw(format!("│ {} │ Carregando...", env))]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }
    };

    let any_violation = kpis.violations_count > 0;
    let period = app.dashboard.period();

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.flag_style(any_violation)),
        title,
        Span::raw(format!("│ {} │ {} dias │ ", env, period.days)),
        Span::styled(
            format_optional(kpis.temperature_mean, format_celsius),
            app.theme
                .flag_style(kpis.temperature_mean.is_some_and(crate::data::temp_violation)),
        ),
        Span::raw(" "),
        Span::styled(
            format_optional(kpis.humidity_mean, format_percent),
            app.theme
                .flag_style(kpis.humidity_mean.is_some_and(crate::data::rh_violation)),
        ),
        Span::raw(" │ "),
        if any_violation {
            Span::styled(
                format_count(kpis.violations_count),
                Style::default().fg(app.theme.violation).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(format!(
            " violações / {} medições",
            format_count(kpis.total_measurements)
        )),
        health,
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = [View::Overview, View::Violations, View::Analytics]
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!(" {}:{} ", i + 1, v.label())))
        .collect();

    let selected = match app.current_view {
        View::Overview => 0,
        View::Violations => 1,
        View::Analytics => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: backend, time since last update, available controls.
/// Also displays temporary notifications.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = app.get_status_message() {
        let paragraph = Paragraph::new(format!(" {} ", notice.message))
            .style(app.theme.notice_style(notice.level));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Violations => "t/u:filtros +/-:limite ↑↓:linha x:json r:atualizar ?:ajuda q:sair",
        _ => "Tab:trocar [/]:período r:atualizar e:exportar ?:ajuda q:sair",
    };

    let status = match app.seconds_since_update() {
        Some(elapsed) => format!(
            " {} | Atualizado há {:.0}s{} | {}",
            app.source_description(),
            elapsed,
            if app.refreshing { " (atualizando)" } else { "" },
            controls
        ),
        None => format!(" {} | Carregando... | q:sair", app.source_description()),
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Atalhos", app.theme.header)]),
        Line::from(""),
        section(" Navegação"),
        Line::from("  Tab/1-3     Trocar de visão"),
        Line::from("  ↑/↓ j/k     Selecionar linha"),
        Line::from("  PgUp/PgDn   Pular 10 linhas"),
        Line::from(""),
        section(" Violações"),
        Line::from("  t         Filtro de temperatura"),
        Line::from("  u         Filtro de umidade"),
        Line::from("  + / -     Limite de registros"),
        Line::from("  [ / ]     Período em dias"),
        Line::from(""),
        section(" Geral"),
        Line::from("  r         Atualizar agora"),
        Line::from("  e         Exportar página HTML"),
        Line::from("  x         Exportar registros (JSON)"),
        Line::from("  q         Sair"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Qualquer tecla fecha",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Ajuda ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Bordered block in the current theme.
pub fn block<'a>(app: &App, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}
