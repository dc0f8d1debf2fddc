use std::borrow::Cow;

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{
    app::AppState,
    ui::{Layout, Theme, components::StatusBar},
};
use swarmtail_logs::{
    ArcLogLine, ConnectionState, LogLevel, LogLine, SearchQuery, StreamController,
};

/// Widest source column before names are cut
const MAX_SOURCE_WIDTH: usize = 20;

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, stream: &StreamController) {
        let banner = stream
            .last_error()
            .map(str::to_string)
            .or_else(|| state.ui_state.error_message.clone());
        let show_search = state.ui_state.search_active || !state.ui_state.view.search().is_empty();

        let areas = Layout::log_viewer(
            frame.area(),
            banner.is_some(),
            state.ui_state.stats_visible,
            show_search,
        );

        Self::render_header(frame, areas.header, state, stream);
        if let (Some(area), Some(message)) = (areas.banner, banner) {
            Self::render_banner(frame, area, &message);
        }
        if let Some(area) = areas.stats {
            Self::render_stats_bar(frame, area, stream);
        }
        if let Some(area) = areas.search {
            Self::render_search_bar(frame, area, state);
        }
        Self::render_logs(frame, areas.logs, state, stream);
        Self::render_status_bar(frame, areas.status, state, stream);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, stream: &StreamController) {
        let indicator = stream.indicator();

        let mut spans = vec![
            Span::styled("swarmtail", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.stream_label(stream.filter()), Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("● {}", indicator.label()), Theme::indicator(indicator)),
        ];

        if stream.reconnect_pending() {
            spans.push(Span::styled(
                format!(
                    " · reconnecting in {}s",
                    stream.config().reconnect_delay.as_secs()
                ),
                Theme::text_dim(),
            ));
        }
        if stream.state() == ConnectionState::Paused && stream.side_buffer_len() > 0 {
            spans.push(Span::styled(
                format!(" · {} held", stream.side_buffer_len()),
                Theme::text_dim(),
            ));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        frame.render_widget(header, area);
    }

    fn render_banner(frame: &mut Frame, area: Rect, message: &str) {
        let line = Line::from(vec![
            Span::styled(format!(" ⚠ {message}"), Theme::banner()),
            Span::styled("  [x] dismiss", Theme::banner()),
        ]);
        frame.render_widget(Paragraph::new(line).style(Theme::banner()), area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, stream: &StreamController) {
        let counts = stream.buffer().level_counts();

        let mut spans = vec![Span::styled(" ", Theme::text())];
        let mut push = |label: &'static str, level: LogLevel, count: usize| {
            spans.push(Span::styled(
                label,
                Style::default()
                    .fg(level.color())
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(format!("{count} "), Theme::text()));
        };

        if counts.fatal > 0 {
            push("FTL:", LogLevel::Fatal, counts.fatal);
        }
        push("ERR:", LogLevel::Error, counts.error);
        push("WRN:", LogLevel::Warn, counts.warn);
        push("INF:", LogLevel::Info, counts.info);
        push("DBG:", LogLevel::Debug, counts.debug);
        if counts.trace > 0 {
            push("TRC:", LogLevel::Trace, counts.trace);
        }

        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let stats = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );
        frame.render_widget(stats, area);
    }

    fn render_search_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let active = state.ui_state.search_active;
        let term = if active {
            state.ui_state.search_input.as_str()
        } else {
            state.ui_state.view.search()
        };

        let mut spans = if active {
            vec![Span::styled(" /", Theme::text_highlight())]
        } else {
            vec![Span::styled(" Search: ", Theme::text_dim())]
        };
        spans.push(Span::styled(term.to_string(), Theme::text_highlight()));

        if active {
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Theme::HIGHLIGHT)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
            spans.push(Span::styled(
                "  [Enter] Keep  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else {
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::text_dim()));
        }

        let border = if active {
            Style::default().fg(Theme::HIGHLIGHT)
        } else {
            Theme::border()
        };
        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(" Search ", Theme::title())),
        );
        frame.render_widget(bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, stream: &StreamController) {
        let inner_height = area.height.saturating_sub(2) as usize;
        let ui = &mut state.ui_state;

        let visible = ui.view.visible(stream.buffer());
        let total = visible.len();
        let max_scroll = total.saturating_sub(inner_height);
        if ui.auto_scroll || ui.log_scroll > max_scroll {
            ui.log_scroll = max_scroll;
        }

        // Copy the window out so formatting doesn't hold the view borrow
        let window: Vec<ArcLogLine> = visible
            .iter()
            .skip(ui.log_scroll)
            .take(inner_height)
            .cloned()
            .collect();

        let query = ui.view.query().clone();
        let options = LineOptions {
            show_timestamps: ui.show_timestamps,
            use_local_time: ui.use_local_time,
            source_width: if ui.show_sources {
                source_column_width(&window)
            } else {
                0
            },
            // Borders and scrollbar
            width: area.width.saturating_sub(4) as usize,
        };

        let lines: Vec<Line> = window
            .iter()
            .map(|line| format_line(line, &query, &options))
            .collect();

        let title = if query.is_empty() {
            format!(" Logs ({total}) ")
        } else {
            format!(" Logs ({total} matching) ")
        };
        let logs = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(logs, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(ui.log_scroll);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, stream: &StreamController) {
        let buffer = stream.buffer();
        let counts = buffer.level_counts();
        let pause_hint = if stream.state() == ConnectionState::Paused {
            "Resume"
        } else {
            "Pause"
        };

        let mut right = format!(
            "E:{} W:{} | {}/{} lines {}",
            counts.error + counts.fatal,
            counts.warn,
            buffer.len(),
            buffer.capacity(),
            if state.ui_state.auto_scroll { "▼" } else { " " }
        );
        if let Some(status) = &state.ui_state.status_message {
            right = format!("{status} | {right}");
        }

        let status = StatusBar::new()
            .hints([
                ("Space", pause_hint),
                ("/", "Search"),
                ("e", "Export"),
                ("?", "Help"),
                ("Esc", "Back"),
            ])
            .right(right);
        frame.render_widget(status, area);
    }
}

struct LineOptions {
    show_timestamps: bool,
    use_local_time: bool,
    /// Zero hides the source column
    source_width: usize,
    width: usize,
}

fn source_column_width(lines: &[ArcLogLine]) -> usize {
    lines
        .iter()
        .filter_map(|line| line.short_source())
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0)
        .min(MAX_SOURCE_WIDTH)
}

/// Prefix columns then the message, cut to the pane width
fn format_line(line: &LogLine, query: &SearchQuery, options: &LineOptions) -> Line<'static> {
    let mut spans = Vec::new();

    if options.show_timestamps {
        let ts = line.timestamp.unwrap_or(line.received_at);
        let time = if options.use_local_time {
            ts.with_timezone(&Local).format("%H:%M:%S").to_string()
        } else {
            ts.format("%H:%M:%S").to_string()
        };
        spans.push(Span::styled(format!("{time} "), Theme::text_dim()));
    }

    if options.source_width > 0 {
        let source = line.short_source().unwrap_or("");
        let cut = truncate_spans(vec![Span::raw(source.to_string())], options.source_width);
        let text: String = cut.iter().map(|s| s.content.as_ref()).collect();
        let pad = options.source_width.saturating_sub(text.width());
        spans.push(Span::styled(
            format!("{text}{} ", " ".repeat(pad)),
            Style::default().fg(Theme::source_color(source)),
        ));
    }

    spans.push(Span::styled(
        format!("{:>3}", line.level.as_str()),
        Style::default()
            .fg(line.level.color())
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(" │ ", Theme::text_dim()));

    spans.extend(message_spans(line, query));
    Line::from(truncate_spans(spans, options.width))
}

/// Styled segments when there are some and no search is active; otherwise
/// the plain message with matches highlighted.
fn message_spans(line: &LogLine, query: &SearchQuery) -> Vec<Span<'static>> {
    let base = Theme::level_text(line.level);

    if query.is_empty()
        && let Some(segments) = &line.segments
    {
        return segments
            .iter()
            .map(|seg| Span::styled(sanitize(&seg.text).into_owned(), base.patch(seg.style)))
            .collect();
    }

    let message = sanitize(line.message());
    let matches = query.find_matches(&message);
    highlight(&message, &matches, base)
}

fn highlight(text: &str, matches: &[(usize, usize)], base: Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for &(start, end) in matches {
        if start > last {
            spans.push(Span::styled(
                text.get(last..start).unwrap_or_default().to_string(),
                base,
            ));
        }
        spans.push(Span::styled(
            text.get(start..end).unwrap_or_default().to_string(),
            Theme::search_match(),
        ));
        last = end;
    }
    if last < text.len() {
        spans.push(Span::styled(
            text.get(last..).unwrap_or_default().to_string(),
            base,
        ));
    }
    spans
}

/// Make control characters visible so raw escape codes can't drive the terminal
fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' => out.push_str("    "),
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Cut spans to `max_width` display columns, ending in an ellipsis when cut
fn truncate_spans(spans: Vec<Span<'static>>, max_width: usize) -> Vec<Span<'static>> {
    let total: usize = spans.iter().map(|s| s.content.width()).sum();
    if total <= max_width {
        return spans;
    }

    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut out = Vec::new();
    let mut last_style = Style::default();

    for span in spans {
        last_style = span.style;
        let width = span.content.width();
        if used + width <= budget {
            used += width;
            out.push(span);
            continue;
        }

        let mut cut = String::new();
        for c in span.content.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            used += w;
            cut.push(c);
        }
        if !cut.is_empty() {
            out.push(Span::styled(cut, span.style));
        }
        break;
    }

    if max_width > 0 {
        out.push(Span::styled("…", last_style));
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};
    use tokio_util::sync::CancellationToken;
    use url::Url;

    use super::*;
    use swarmtail_logs::{
        ChannelHandle, ChannelSink, StreamConfig, StreamFilter, SwarmLogsEndpoint, Transport,
    };

    /// Opens instantly and delivers a fixed set of lines
    struct Replay(Vec<&'static str>);

    impl Transport for Replay {
        fn open(&self, _endpoint: &Url, sink: ChannelSink) -> ChannelHandle {
            sink.opened();
            for line in &self.0 {
                sink.frame(swarmtail_logs::Frame::from(*line));
            }
            ChannelHandle::new(CancellationToken::new())
        }
    }

    fn streaming(lines: Vec<&'static str>) -> StreamController {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let (mut controller, mut rx) = StreamController::new(
            StreamConfig::swarm(),
            Box::new(SwarmLogsEndpoint::new(&base).unwrap()),
            Arc::new(Replay(lines)),
        );
        controller.mount(StreamFilter::all());
        while let Ok(event) = rx.try_recv() {
            controller.handle_event(event);
        }
        controller
    }

    fn screen_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut text = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn spans_text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_sanitize_escapes_control_characters() {
        assert_eq!(sanitize("plain"), "plain");
        assert_eq!(sanitize("a\tb"), "a    b");
        assert_eq!(sanitize("\u{1b}[31mred"), "\\u{1b}[31mred");
    }

    #[test]
    fn test_truncate_spans_respects_display_width() {
        let spans = vec![Span::raw("ab"), Span::raw("日本語")];
        let cut = truncate_spans(spans, 5);
        assert_eq!(spans_text(&cut), "ab日…");

        let short = truncate_spans(vec![Span::raw("fits")], 10);
        assert_eq!(spans_text(&short), "fits");
    }

    #[test]
    fn test_highlight_splits_on_matches() {
        let spans = highlight("an error occurred", &[(3, 8)], Style::default());
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "error");
        assert_eq!(spans[1].style, Theme::search_match());
    }

    #[test]
    fn test_render_shows_lines_and_search_filter() {
        let mut state = AppState::new();
        let stream = streaming(vec![
            "[web_api.1.abc] started worker",
            "[web_db.1.def] ERROR connection refused",
        ]);

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal
            .draw(|f| LogViewerScreen::render(f, &mut state, &stream))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(text.contains("started worker"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("connected"));
        assert!(!text.contains("disconnected"));

        state.search_input_char('r');
        state.search_input_char('e');
        state.search_input_char('f');
        terminal
            .draw(|f| LogViewerScreen::render(f, &mut state, &stream))
            .unwrap();
        let text = screen_text(terminal.backend().buffer());
        assert!(!text.contains("started worker"));
        assert!(text.contains("1 matching"));
    }
}
