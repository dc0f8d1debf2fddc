use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header, content, and status bar
    pub fn main(area: Rect) -> (Rect, Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        (chunks[0], chunks[1], chunks[2])
    }

    /// A centered content area (for selection screens)
    pub fn centered_list(area: Rect, width_percent: u16) -> Rect {
        let width_percent = width_percent.min(100);
        let side = (100 - width_percent) / 2;

        let horizontal = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(side),
                Constraint::Percentage(width_percent),
                Constraint::Percentage(side),
            ])
            .split(area);

        let vertical = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(horizontal[1]);

        vertical[1]
    }

    /// A centered popup no larger than `area` minus a small margin
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }

    /// Split the log viewer into its optional bars and the log pane
    pub fn log_viewer(
        area: Rect,
        show_banner: bool,
        show_stats: bool,
        show_search: bool,
    ) -> LogViewerAreas {
        let mut constraints = vec![Constraint::Length(3)];
        if show_banner {
            constraints.push(Constraint::Length(1));
        }
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        if show_search {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut next = chunks.iter().copied();
        let mut take = |wanted: bool| if wanted { next.next() } else { None };

        let header = take(true).unwrap_or_default();
        let banner = take(show_banner);
        let stats = take(show_stats);
        let search = take(show_search);
        let logs = take(true).unwrap_or_default();
        let status = take(true).unwrap_or_default();

        LogViewerAreas {
            header,
            banner,
            stats,
            search,
            logs,
            status,
        }
    }
}

/// Regions of the log viewer screen
#[derive(Clone, Copy, Debug)]
pub struct LogViewerAreas {
    pub header: Rect,
    pub banner: Option<Rect>,
    pub stats: Option<Rect>,
    pub search: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_viewer_optional_regions() {
        let area = Rect::new(0, 0, 80, 40);

        let bare = Layout::log_viewer(area, false, false, false);
        assert!(bare.banner.is_none() && bare.stats.is_none() && bare.search.is_none());
        assert_eq!(bare.header.height, 3);
        assert_eq!(bare.status.height, 1);
        assert_eq!(bare.logs.height, 36);

        let full = Layout::log_viewer(area, true, true, true);
        assert_eq!(full.banner.map(|r| r.height), Some(1));
        assert_eq!(full.stats.map(|r| r.height), Some(3));
        assert_eq!(full.search.map(|r| r.height), Some(3));
        assert_eq!(full.logs.height, 29);
    }

    #[test]
    fn test_popup_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 40, 20);
        let popup = Layout::popup(area, 100, 10);
        assert_eq!(popup.width, 36);
        assert_eq!(popup.x, 2);
        assert_eq!(popup.y, 5);
    }
}
