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

/// Service selection screen for one stack (or all of them)
pub struct ServiceSelectScreen;

impl ServiceSelectScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header_area, content_area, status_area) = Layout::main(frame.area());

        Self::render_header(frame, header_area, state);
        Self::render_list(frame, content_area, state);
        Self::render_status_bar(frame, status_area, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let stack = state.selected_stack.as_deref().unwrap_or("all stacks");

        let title = Line::from(vec![
            Span::styled("swarmtail", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(stack, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Select Service", Theme::text()),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_list(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let list_area = Layout::centered_list(area, 80);

        let all = ListEntry::new("All services")
            .detail(format!("{} services", state.services.len()))
            .emphasized(true);
        let entries = std::iter::once(all).chain(state.services.iter().map(|svc| {
            // Highlight when every desired replica is running
            let healthy = svc.desired_count > 0 && svc.current_count == svc.desired_count;
            let mut detail = svc.replica_status();
            if !svc.image.is_empty() {
                detail.push_str("  ");
                detail.push_str(&svc.image);
            }
            ListEntry::new(&svc.name).detail(detail).emphasized(healthy)
        }));

        let selector = ListSelector::new("Services").entries(entries);
        frame.render_stateful_widget(selector, list_area, &mut state.ui_state.list_state);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let right = match &state.ui_state.error_message {
            Some(err) => err.clone(),
            None => format!("{} services", state.services.len()),
        };
        let status = StatusBar::new().hints(list_nav_hints()).right(right);
        frame.render_widget(status, area);
    }
}
