//! Terminal UI for swarmtail
//!
//! Screen state, keybindings, terminal event handling and the widgets
//! that draw stacks, services and the live log stream.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Screen, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, ListEntry, ListSelector, StatusBar, list_nav_hints};
pub use ui::screens::{LogViewerScreen, ServiceSelectScreen, StackSelectScreen};
pub use ui::{Layout, LogViewerAreas, Theme};
