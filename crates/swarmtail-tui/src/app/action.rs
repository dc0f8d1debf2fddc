use crate::app::Screen;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Navigate(Screen),
    GoBack,
    Quit,

    // Selection (`None` = every stack / every service of the stack)
    SelectStack(Option<String>),
    SelectService(Option<String>),

    ToggleHelp,

    // List navigation
    ListUp,
    ListDown,
    ListSelect,
    RefreshDirectory,

    // Search in log viewer
    OpenSearch,
    CloseSearch,
    ApplySearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    ClearSearch,

    // Log viewer
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,
    ToggleAutoScroll,
    ToggleTimestamps,
    ToggleLocalTime,
    ToggleSources,
    ToggleStats,

    // Stream commands
    TogglePause,
    ClearLogs,
    ExportLogs,

    // Error handling
    ShowError(String),
    DismissError,

    Tick,
    Render,
}
