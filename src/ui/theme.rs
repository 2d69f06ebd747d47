//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::RecordStatus;
use crate::notify::Level;
use crate::render::AiStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for partial/degraded states.
    pub warning: Color,
    /// Color for violations and errors.
    pub violation: Color,
    /// Color for in-range readings.
    pub normal: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            violation: Color::Red,
            normal: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            violation: Color::Red,
            normal: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a single threshold check.
    pub fn flag_style(&self, violation: bool) -> Style {
        if violation {
            Style::default().fg(self.violation).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.normal)
        }
    }

    /// Style for a record's overall status.
    pub fn status_style(&self, status: RecordStatus) -> Style {
        self.flag_style(status == RecordStatus::Violation)
    }

    pub fn ai_style(&self, status: AiStatus) -> Style {
        match status {
            AiStatus::Active => Style::default().fg(self.normal),
            AiStatus::Partial => Style::default().fg(self.warning),
            AiStatus::Unavailable => Style::default().fg(self.violation),
            AiStatus::Disabled => Style::default().add_modifier(Modifier::DIM),
        }
    }

    pub fn notice_style(&self, level: Level) -> Style {
        match level {
            Level::Info => Style::default().fg(self.highlight),
            Level::Warning => Style::default().fg(self.warning),
            Level::Error => Style::default().fg(self.violation).add_modifier(Modifier::BOLD),
        }
    }
}
