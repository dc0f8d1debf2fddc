use ratatui::style::{Color, Modifier, Style};

use swarmtail_types::{ConnectionIndicator, LogLevel};

/// Color theme for the application
pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;

    /// Palette for per-service source names
    const SOURCE_COLORS: [Color; 8] = [
        Color::Cyan,
        Color::Magenta,
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::LightRed,
        Color::LightCyan,
        Color::LightMagenta,
    ];

    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn list_item() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Healthy / "all" entries
    pub fn list_item_emphasized() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    /// Full-width error banner
    pub fn banner() -> Style {
        Style::default()
            .fg(Color::White)
            .bg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn search_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn indicator(indicator: ConnectionIndicator) -> Style {
        Style::default()
            .fg(indicator.color())
            .add_modifier(Modifier::BOLD)
    }

    /// Message style for lines without terminal styling
    pub fn level_text(level: LogLevel) -> Style {
        match level {
            LogLevel::Error | LogLevel::Fatal => Style::default().fg(Color::Red),
            LogLevel::Warn => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Self::FG),
        }
    }

    /// Stable color for a service name
    pub fn source_color(source: &str) -> Color {
        let hash = source
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        Self::SOURCE_COLORS[hash as usize % Self::SOURCE_COLORS.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_color_is_stable() {
        assert_eq!(Theme::source_color("web_api"), Theme::source_color("web_api"));
    }

    #[test]
    fn test_level_text_colors() {
        assert_eq!(Theme::level_text(LogLevel::Error).fg, Some(Color::Red));
        assert_eq!(Theme::level_text(LogLevel::Info).fg, Some(Theme::FG));
    }
}
