use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, StatefulWidget},
};

use crate::ui::Theme;

/// One row of a selection list
#[derive(Debug, Clone, Default)]
pub struct ListEntry {
    pub label: String,
    /// Dimmed text after the label
    pub detail: Option<String>,
    pub emphasized: bool,
}

impl ListEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn emphasized(mut self, emphasized: bool) -> Self {
        self.emphasized = emphasized;
        self
    }

    fn into_item<'a>(self) -> ListItem<'a> {
        let style = if self.emphasized {
            Theme::list_item_emphasized()
        } else {
            Theme::list_item()
        };
        let mut spans = vec![Span::styled(self.label, style)];
        if let Some(detail) = self.detail {
            spans.push(Span::styled(format!("  {detail}"), Theme::text_dim()));
        }
        ListItem::new(Line::from(spans))
    }
}

/// Bordered list of [`ListEntry`] rows
pub struct ListSelector<'a> {
    entries: Vec<ListEntry>,
    title: &'a str,
}

impl<'a> ListSelector<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            entries: Vec::new(),
            title,
        }
    }

    pub fn entries<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = ListEntry>,
    {
        self.entries = entries.into_iter().collect();
        self
    }
}

impl StatefulWidget for ListSelector<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(format!(" {} ", self.title), Theme::title()));

        let items: Vec<ListItem> = self.entries.into_iter().map(ListEntry::into_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol("▶ ");

        StatefulWidget::render(list, area, buf, state);
    }
}
