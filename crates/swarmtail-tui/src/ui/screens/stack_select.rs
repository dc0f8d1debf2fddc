use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    app::AppState,
    ui::{
        Layout, Theme,
        components::{ListEntry, ListSelector, StatusBar, list_nav_hints},
    },
};

/// Stack selection screen
pub struct StackSelectScreen;

impl StackSelectScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, api_url: &str) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        Self::render_header(frame, header_area, api_url);
        Self::render_list(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, api_url: &str) {
        let title = Line::from(vec![
            Span::styled("swarmtail", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(api_url, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Select Stack", Theme::text()),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_list(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let list_area = Layout::centered_list(area, 70);

        let all = ListEntry::new("All stacks")
            .detail(format!("{} stacks", state.stacks.len()))
            .emphasized(true);
        let entries = std::iter::once(all).chain(state.stacks.iter().map(|stack| {
            let count = stack.services.len();
            ListEntry::new(&stack.name).detail(format!(
                "{count} service{}",
                if count == 1 { "" } else { "s" }
            ))
        }));

        let title = if state.ui_state.loading {
            "Stacks (loading…)"
        } else {
            "Stacks"
        };
        let selector = ListSelector::new(title).entries(entries);
        frame.render_stateful_widget(selector, list_area, &mut state.ui_state.list_state);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let right = match &state.ui_state.error_message {
            Some(err) => err.clone(),
            None => format!("{} stacks", state.stacks.len()),
        };
        let status = StatusBar::new().hints(list_nav_hints()).right(right);
        frame.render_widget(status, area);
    }
}
