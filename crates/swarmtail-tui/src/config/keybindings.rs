use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    ListNavigation,
    LogViewer,
    SearchInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        bindings.insert(
            KeyContext::Global,
            HashMap::from([
                (KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp),
                (KeyBinding::new(KeyCode::Esc), Action::GoBack),
                (KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit),
                (KeyBinding::new(KeyCode::Char('q')), Action::Quit),
                (KeyBinding::new(KeyCode::Char('x')), Action::DismissError),
            ]),
        );

        bindings.insert(
            KeyContext::ListNavigation,
            HashMap::from([
                (KeyBinding::new(KeyCode::Char('j')), Action::ListDown),
                (KeyBinding::new(KeyCode::Down), Action::ListDown),
                (KeyBinding::new(KeyCode::Char('k')), Action::ListUp),
                (KeyBinding::new(KeyCode::Up), Action::ListUp),
                (KeyBinding::new(KeyCode::Enter), Action::ListSelect),
                (KeyBinding::new(KeyCode::Char('r')), Action::RefreshDirectory),
            ]),
        );

        // less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::TogglePause);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::ClearSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearLogs);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('e')), Action::ExportLogs);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('t')), Action::ToggleTimestamps);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('T')), Action::ToggleLocalTime);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('o')), Action::ToggleSources);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        bindings.insert(
            KeyContext::SearchInput,
            HashMap::from([
                (KeyBinding::new(KeyCode::Enter), Action::ApplySearch),
                (KeyBinding::new(KeyCode::Esc), Action::CloseSearch),
                (KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace),
                (KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear),
                (KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch),
            ]),
        );

        Self { bindings }
    }

    fn lookup(&self, context: KeyContext, binding: &KeyBinding) -> Option<Action> {
        self.bindings.get(&context)?.get(binding).cloned()
    }

    /// Look up action for key event in given context, falling back to globals
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);
        self.lookup(context, &binding)
            .or_else(|| self.lookup(KeyContext::Global, &binding))
    }

    /// Handle key event while the search bar has focus.
    /// Printable characters become [`Action::SearchInput`].
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);
        if let Some(action) = self.lookup(KeyContext::SearchInput, &binding) {
            return Some(action);
        }

        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                Some(Action::SearchInput(c))
            }
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
