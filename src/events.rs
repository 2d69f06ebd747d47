use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Violations),
        KeyCode::Char('3') => app.set_view(View::Analytics),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        // Table navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Filters
        KeyCode::Char('t') => app.toggle_temperature_filter(),
        KeyCode::Char('u') => app.toggle_humidity_filter(),

        // Row limit and period
        KeyCode::Char('+') | KeyCode::Char('=') => app.cycle_limit(true),
        KeyCode::Char('-') => app.cycle_limit(false),
        KeyCode::Char(']') => app.cycle_days(true),
        KeyCode::Char('[') => app.cycle_days(false),

        // Refresh
        KeyCode::Char('r') => {
            app.request_refresh();
            app.set_status_message("Atualizando...".to_string());
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => app.export(),
        KeyCode::Char('x') => app.export_records(),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Rows of the violations table (after the block border and header)
            if app.current_view == View::Violations && clicked_row > content_start_row + 1 {
                let item_row = (clicked_row - content_start_row - 2) as usize;
                if item_row < app.dashboard.visible_records().len() {
                    app.selected_row = item_row;
                }
            }

            // Tab clicks (row 1, after header)
            if clicked_row == 1 {
                // Approximate tab positions: " 1:Visão geral " | " 2:Violações " | " 3:Análise "
                let col = mouse.column;
                if col < 16 {
                    app.set_view(View::Overview);
                } else if col < 30 {
                    app.set_view(View::Violations);
                } else if col < 42 {
                    app.set_view(View::Analytics);
                }
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::dashboard::Dashboard;
    use crate::notify::StatusLine;
    use crate::source::mock::MockClient;
    use std::sync::Arc;

    fn app() -> App {
        let dashboard = Dashboard::from_config(ConfigStore::default(), Arc::new(MockClient::new()));
        App::new(dashboard, None, StatusLine::new())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_filter_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('t'));
        assert!(app.dashboard.toggles().temperature);
        press(&mut app, KeyCode::Char('u'));
        assert!(app.dashboard.toggles().humidity);
        press(&mut app, KeyCode::Char('t'));
        assert!(!app.dashboard.toggles().temperature);
    }

    #[test]
    fn test_view_and_limit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_view, View::Analytics);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Overview);

        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.dashboard.period().limit, 20);
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.dashboard.period().days, 15);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_records_export_key_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.records_path = dir.path().join("records.json");
        press(&mut app, KeyCode::Char('x'));

        assert!(!app.records_path.exists());
        let notice = app.get_status_message().unwrap();
        assert!(notice.message.contains("No data to export"));
    }
}
