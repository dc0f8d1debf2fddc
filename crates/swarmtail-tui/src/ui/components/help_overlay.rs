use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Scrolling",
        &[
            ("j/↓", "Scroll down"),
            ("k/↑", "Scroll up"),
            ("Ctrl+d", "Page down"),
            ("Ctrl+u", "Page up"),
            ("g/Home", "Oldest line"),
            ("G/End", "Newest line"),
            ("f", "Toggle follow"),
        ],
    ),
    (
        "Stream",
        &[
            ("Space", "Pause / resume"),
            ("c", "Clear buffer"),
            ("e", "Export visible lines"),
        ],
    ),
    (
        "Display",
        &[
            ("/", "Search"),
            ("n", "Clear search"),
            ("t", "Toggle timestamps"),
            ("T", "Local time / UTC"),
            ("o", "Toggle sources"),
            ("s", "Toggle level stats"),
        ],
    ),
    (
        "General",
        &[
            ("x", "Dismiss error"),
            ("?", "Toggle this help"),
            ("Esc", "Go back"),
            ("q", "Quit"),
        ],
    ),
];

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let mut lines = vec![
            Line::from(Span::styled("Keybindings", Theme::title())),
        ];
        for (heading, keys) in SECTIONS {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(*heading, Theme::text_highlight())));
            lines.extend(keys.iter().map(|(key, desc)| Self::key_line(key, desc)));
        }

        let height = lines.len() as u16 + 2;
        let area = Layout::popup(frame.area(), 46, height);
        frame.render_widget(Clear, area);

        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border_focused())
                .title(Span::styled(" Help ", Theme::title())),
        );
        frame.render_widget(help, area);
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {key:>8}"), Theme::list_item_emphasized()),
            Span::styled(format!("  {desc}"), Theme::text()),
        ])
    }
}
