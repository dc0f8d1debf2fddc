use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::Theme;

/// One-line bar of key hints with optional right-aligned text
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right_text: None,
        }
    }

    /// Keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{key}]"), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {desc}"), Theme::status_bar()));
        }
        let line = Line::from(spans);
        let left_end = area.x + 1 + line.width() as u16;
        buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));

        // Right text wins over hints that would run underneath it
        if let Some(right) = self.right_text {
            let width = right.width() as u16;
            let right_x = area.x + area.width.saturating_sub(width + 1);
            if right_x > area.x {
                if right_x <= left_end {
                    let gap = Rect::new(right_x.saturating_sub(1), area.y, 1, 1);
                    buf.set_style(gap, Theme::status_bar());
                }
                buf.set_span(right_x, area.y, &Span::styled(right, Theme::status_bar()), width);
            }
        }
    }
}

/// Hints shared by the selection screens
pub fn list_nav_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("↑/k", "Up"),
        ("↓/j", "Down"),
        ("Enter", "Select"),
        ("r", "Refresh"),
        ("Esc", "Back"),
        ("q", "Quit"),
    ]
}
