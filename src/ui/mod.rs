//! Terminal rendering using ratatui.

pub mod analytics;
pub mod common;
pub mod overview;
pub mod theme;
pub mod violations;

pub use theme::Theme;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render a sparkline from 0-7 levels.
pub fn render_sparkline(levels: &[u8]) -> String {
    levels
        .iter()
        .map(|&l| SPARKLINE_CHARS[(l as usize).min(SPARKLINE_CHARS.len() - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sparkline() {
        assert_eq!(render_sparkline(&[0, 3, 7, 9]), "▁▄██");
        assert_eq!(render_sparkline(&[]), "");
    }
}
