//! Application state and navigation logic.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use tracing::{info, warn};

use crate::dashboard::Dashboard;
use crate::notify::{Level, Notice, Notifier, StatusLine, STATUS_TTL};
use crate::refresh::{RefreshEvent, Scheduler};
use crate::ui::Theme;

/// Period choices offered by the `[` / `]` keys, in days.
pub const DAY_OPTIONS: [u32; 6] = [1, 7, 15, 30, 90, 365];

/// Default file for the `e` export key.
pub const EXPORT_FILE: &str = "envwatch_dashboard.html";

/// Default file for the `x` key, which writes the filtered records.
pub const EXPORT_JSON_FILE: &str = "envwatch_violations.json";

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// KPI cards, trends and the analytics status.
    Overview,
    /// The filtered violation table.
    Violations,
    /// The four analytic facets in detail.
    Analytics,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Violations,
            View::Violations => View::Analytics,
            View::Analytics => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Analytics,
            View::Violations => View::Overview,
            View::Analytics => View::Violations,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Visão geral",
            View::Violations => "Violações",
            View::Analytics => "Análise",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    pub dashboard: Dashboard,
    scheduler: Option<Scheduler>,
    pub status: StatusLine,
    pub refreshing: bool,

    // Navigation state (Violations view)
    pub selected_row: usize,

    // UI
    pub theme: Theme,
    pub export_path: PathBuf,
    pub records_path: PathBuf,
}

impl App {
    /// Create a new App. Without a scheduler the app never refreshes; that
    /// is only useful for tests and static displays.
    pub fn new(dashboard: Dashboard, scheduler: Option<Scheduler>, status: StatusLine) -> Self {
        let refreshing = scheduler.is_some();
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            dashboard,
            scheduler,
            status,
            refreshing,
            selected_row: 0,
            theme: Theme::dark(),
            export_path: PathBuf::from(EXPORT_FILE),
            records_path: PathBuf::from(EXPORT_JSON_FILE),
        }
    }

    /// Use a specific theme, e.g. [`Theme::auto_detect()`].
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the backend.
    pub fn source_description(&self) -> &str {
        self.dashboard.fetcher().description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status.notify(Level::Info, &message);
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<Notice> {
        self.status.current(STATUS_TTL)
    }

    /// Apply every finished cycle.
    ///
    /// Returns true if at least one cycle was applied.
    pub fn reload_data(&mut self) -> bool {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return false;
        };

        let mut applied = false;
        while let Some(event) = scheduler.poll() {
            match event {
                RefreshEvent::Cycle(outcome) => {
                    if self.dashboard.apply(outcome) {
                        applied = true;
                    }
                }
                RefreshEvent::Failed(message) => {
                    self.status
                        .notify(Level::Error, &format!("Falha na atualização: {}", message));
                }
            }
        }

        if applied {
            self.refreshing = false;
            if let Some(err) = self.dashboard.violations_error() {
                self.status
                    .notify(Level::Warning, &format!("Violações indisponíveis: {}", err));
            }
            self.clamp_selection();
        }
        applied
    }

    /// Ask for an immediate cycle.
    pub fn request_refresh(&mut self) {
        if let Some(scheduler) = &self.scheduler {
            scheduler.set_period(self.dashboard.period());
            scheduler.trigger();
            self.refreshing = true;
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    fn visible_count(&self) -> usize {
        self.dashboard.visible_records().len()
    }

    fn clamp_selection(&mut self) {
        self.selected_row = self.selected_row.min(self.visible_count().saturating_sub(1));
    }

    /// Move selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_row = (self.selected_row + n).min(max);
    }

    /// Move selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_row = self.selected_row.saturating_sub(n);
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_first(&mut self) {
        self.selected_row = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_row = self.visible_count().saturating_sub(1);
    }

    pub fn toggle_temperature_filter(&mut self) {
        self.dashboard.toggle_temperature();
        self.clamp_selection();
        self.announce_filter();
    }

    pub fn toggle_humidity_filter(&mut self) {
        self.dashboard.toggle_humidity();
        self.clamp_selection();
        self.announce_filter();
    }

    fn announce_filter(&mut self) {
        let message = format!(
            "Filtro: {} ({} de {})",
            self.dashboard.toggles().describe(),
            self.visible_count(),
            self.dashboard.records().len()
        );
        self.set_status_message(message);
    }

    /// Step the row limit through its configured options and refetch.
    pub fn cycle_limit(&mut self, forward: bool) {
        let options = self.dashboard.limit_options();
        let current = self.dashboard.period().limit;
        let Some(next) = step(&options, current, forward) else {
            return;
        };
        if self.dashboard.set_limit(next) {
            self.set_status_message(format!("Limite: {} registros", next));
            self.request_refresh();
        }
    }

    /// Step the reporting window through [`DAY_OPTIONS`] and refetch.
    pub fn cycle_days(&mut self, forward: bool) {
        let current = self.dashboard.period().days;
        let Some(next) = step(&DAY_OPTIONS, current, forward) else {
            return;
        };
        if self.dashboard.set_days(next) {
            self.set_status_message(format!("Período: {} dias", next));
            self.request_refresh();
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the rendered dashboard as a standalone HTML page.
    pub fn export_page(&self, path: &Path) -> Result<()> {
        if self.dashboard.last_updated().is_none() {
            anyhow::bail!("No data to export");
        }
        self.dashboard.export_page(path)
    }

    /// Export the filtered records as JSON.
    pub fn export_records_to(&self, path: &Path) -> Result<()> {
        if self.dashboard.last_updated().is_none() {
            anyhow::bail!("No data to export");
        }
        self.dashboard.export_records(path)
    }

    /// Export to [`App::export_path`] and report the result.
    pub fn export(&mut self) {
        let path = self.export_path.clone();
        let result = self.export_page(&path);
        self.report_export(&path, result);
    }

    /// Export to [`App::records_path`] and report the result.
    pub fn export_records(&mut self) {
        let path = self.records_path.clone();
        let result = self.export_records_to(&path);
        self.report_export(&path, result);
    }

    fn report_export(&mut self, path: &Path, result: Result<()>) {
        match result {
            Ok(()) => {
                info!("Exported to {}", path.display());
                self.set_status_message(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.status.notify(Level::Error, &format!("Export failed: {}", e));
            }
        }
    }

    /// Seconds since the last applied cycle.
    pub fn seconds_since_update(&self) -> Option<f64> {
        self.dashboard
            .last_updated()
            .map(|t| Instant::now().duration_since(t).as_secs_f64())
    }
}

/// The option after (or before) `current`. A value not in the list snaps to
/// the nearest option in the requested direction.
fn step(options: &[u32], current: u32, forward: bool) -> Option<u32> {
    if forward {
        options.iter().copied().find(|&o| o > current)
    } else {
        options.iter().rev().copied().find(|&o| o < current)
    }
}
