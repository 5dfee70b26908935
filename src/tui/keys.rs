use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub label: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    pub const fn new(
        key: KeyCode,
        modifiers: KeyModifiers,
        label: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            modifiers,
            label,
            description,
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.code && self.modifiers == event.modifiers
    }
}

/// Application-wide key mappings. Page keys live with each page.
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: KeyBinding,
    pub help: KeyBinding,
    pub back: KeyBinding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            quit: KeyBinding::new(KeyCode::Char('c'), KeyModifiers::CONTROL, "Ctrl+C", "Quit"),
            help: KeyBinding::new(
                KeyCode::Char('g'),
                KeyModifiers::CONTROL,
                "Ctrl+G",
                "Show/hide help",
            ),
            back: KeyBinding::new(KeyCode::Esc, KeyModifiers::NONE, "Esc", "Back"),
        }
    }
}

impl KeyMap {
    pub fn should_quit(&self, event: &KeyEvent) -> bool {
        self.quit.matches(event)
    }

    pub fn should_show_help(&self, event: &KeyEvent) -> bool {
        self.help.matches(event)
    }

    pub fn should_go_back(&self, event: &KeyEvent) -> bool {
        self.back.matches(event)
    }

    /// Global bindings as (key, description) rows for the help overlay
    pub fn help_entries(&self) -> Vec<(&'static str, &'static str)> {
        [&self.quit, &self.help, &self.back]
            .into_iter()
            .map(|binding| (binding.label, binding.description))
            .collect()
    }

    /// Pagination keys shared by every list page
    pub fn list_help_entries() -> Vec<(&'static str, &'static str)> {
        vec![
            ("↑/k ↓/j", "Move selection"),
            ("Home/g", "First page"),
            ("←/h", "Previous page"),
            ("→/l", "Next page"),
            ("End/G", "Last page"),
        ]
    }
}
