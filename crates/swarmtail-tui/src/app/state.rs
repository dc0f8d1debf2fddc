use ratatui::widgets::ListState;

use super::Action;
use swarmtail_logs::LogView;
use swarmtail_types::{FilterError, ServiceInfo, StackInfo, StreamFilter};

/// Screen enumeration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    StackSelect,
    ServiceSelect,
    LogViewer,
}

/// UI-specific transient state
pub struct UiState {
    /// Is the search bar taking input?
    pub search_active: bool,

    /// Search text being typed (applied live)
    pub search_input: String,

    pub help_visible: bool,

    /// List state for selection screens
    pub list_state: ListState,

    /// UI-level error (directory load, export failure)
    pub error_message: Option<String>,

    /// Transient notice, e.g. where an export was written
    pub status_message: Option<String>,

    /// Directory request in flight
    pub loading: bool,

    // Log viewer
    pub log_scroll: usize,

    /// Follow mode: stick to the newest line
    pub auto_scroll: bool,

    pub show_timestamps: bool,

    /// Timestamps in local time (vs UTC)
    pub use_local_time: bool,

    /// Show the `[service]` source column
    pub show_sources: bool,

    pub stats_visible: bool,

    /// Search projection over the stream buffer
    pub view: LogView,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            search_active: false,
            search_input: String::new(),
            help_visible: false,
            list_state: ListState::default(),
            error_message: None,
            status_message: None,
            loading: false,
            log_scroll: 0,
            auto_scroll: true,
            show_timestamps: true,
            use_local_time: true,
            show_sources: true,
            stats_visible: false,
            view: LogView::new(),
        }
    }
}

/// Global application state
pub struct AppState {
    pub current_screen: Screen,

    /// Navigation stack for back navigation
    pub screen_stack: Vec<Screen>,

    pub stacks: Vec<StackInfo>,

    /// `None` = all stacks
    pub selected_stack: Option<String>,

    /// Services of the selected stack
    pub services: Vec<ServiceInfo>,

    /// `None` = all services of the stack
    pub selected_service: Option<String>,

    /// Set when streaming a single service by id
    pub fixed_service: Option<String>,

    pub ui_state: UiState,

    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let mut ui_state = UiState::default();
        ui_state.list_state.select(Some(0));

        Self {
            current_screen: Screen::StackSelect,
            screen_stack: Vec::new(),
            stacks: Vec::new(),
            selected_stack: None,
            services: Vec::new(),
            selected_service: None,
            fixed_service: None,
            ui_state,
            should_quit: false,
        }
    }

    /// Navigate to a new screen, pushing current to stack
    pub fn navigate_to(&mut self, screen: Screen) {
        if self.current_screen == screen {
            return;
        }
        self.screen_stack.push(self.current_screen);
        self.current_screen = screen;
        self.ui_state.list_state.select(Some(0));
    }

    /// Go back to previous screen
    pub fn go_back(&mut self) -> bool {
        match self.screen_stack.pop() {
            Some(prev_screen) => {
                self.current_screen = prev_screen;
                self.ui_state.list_state.select(Some(0));
                true
            }
            None => false,
        }
    }

    /// List length on the current screen, including the leading "all" entry
    pub fn current_list_len(&self) -> usize {
        match self.current_screen {
            Screen::StackSelect => self.stacks.len() + 1,
            Screen::ServiceSelect => self.services.len() + 1,
            Screen::LogViewer => 0,
        }
    }

    /// Move selection up (wraps)
    pub fn list_up(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }

        let i = match self.ui_state.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.ui_state.list_state.select(Some(i));
    }

    /// Move selection down (wraps)
    pub fn list_down(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }

        let i = match self.ui_state.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.ui_state.list_state.select(Some(i));
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.ui_state.list_state.selected()
    }

    /// The action the highlighted list entry stands for
    pub fn selection_action(&self) -> Option<Action> {
        let idx = self.selected_index()?;
        match self.current_screen {
            Screen::StackSelect => match idx {
                0 => Some(Action::SelectStack(None)),
                i => self
                    .stacks
                    .get(i - 1)
                    .map(|s| Action::SelectStack(Some(s.name.clone()))),
            },
            Screen::ServiceSelect => match idx {
                0 => Some(Action::SelectService(None)),
                i => self
                    .services
                    .get(i - 1)
                    .map(|s| Action::SelectService(Some(s.name.clone()))),
            },
            Screen::LogViewer => None,
        }
    }

    /// Stream filter for the current stack/service selection
    pub fn selection_filter(&self) -> Result<StreamFilter, FilterError> {
        StreamFilter::new(self.selected_stack.clone(), self.selected_service.clone())
    }

    /// Header label for what is being streamed
    pub fn stream_label(&self, filter: &StreamFilter) -> String {
        match &self.fixed_service {
            Some(id) => format!("service {}", id),
            None => filter.label(),
        }
    }

    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    pub fn set_status(&mut self, msg: String) {
        self.ui_state.status_message = Some(msg);
    }

    /// Open the search bar, editing the current term
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
        self.ui_state.search_input = self.ui_state.view.search().to_string();
    }

    /// Close the search bar and drop the term
    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.clear_search();
    }

    /// Close the search bar, keeping the term
    pub fn apply_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.log_scroll = 0;
    }

    pub fn clear_search(&mut self) {
        self.ui_state.search_input.clear();
        self.ui_state.view.set_search("");
    }

    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
        self.ui_state.view.set_search(&self.ui_state.search_input);
    }

    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
        self.ui_state.view.set_search(&self.ui_state.search_input);
    }

    /// Reset log viewer position when a new stream starts
    pub fn reset_log_view(&mut self) {
        self.ui_state.log_scroll = 0;
        self.ui_state.auto_scroll = true;
        self.ui_state.search_active = false;
        self.clear_search();
    }
}
