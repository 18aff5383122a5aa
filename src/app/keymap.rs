//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Bindings apply to the list and details screens. The form screen takes raw
//! text input and only honours its own fixed keys (arrows, Enter, Esc).

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic keyboard actions that can be bound to key combinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Leave the current screen.
    Back,
    /// Open the details of the selected user.
    OpenDetails,
    /// Open an empty form.
    NewUser,
    /// Open the form pre-filled with the shown user.
    EditUser,
    /// Ask to delete the shown user.
    DeleteUser,
    /// Show or hide the keybindings panel.
    ToggleKeybindsPane,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Ignore this key.
    Ignore,
}

/// Every action with its config-file name.
const ACTIONS: [(KeyAction, &str); 12] = [
    (KeyAction::Quit, "Quit"),
    (KeyAction::Back, "Back"),
    (KeyAction::OpenDetails, "OpenDetails"),
    (KeyAction::NewUser, "NewUser"),
    (KeyAction::EditUser, "EditUser"),
    (KeyAction::DeleteUser, "DeleteUser"),
    (KeyAction::ToggleKeybindsPane, "ToggleKeybindsPane"),
    (KeyAction::MoveUp, "MoveUp"),
    (KeyAction::MoveDown, "MoveDown"),
    (KeyAction::PageUp, "PageUp"),
    (KeyAction::PageDown, "PageDown"),
    (KeyAction::Ignore, "Ignore"),
];

/// Default bindings as (key spec, action), also used for `keybinds.conf`.
const DEFAULTS: [(&str, KeyAction); 19] = [
    ("q", KeyAction::Quit),
    ("Esc", KeyAction::Back),
    ("Backspace", KeyAction::Back),
    ("Enter", KeyAction::OpenDetails),
    ("n", KeyAction::NewUser),
    ("e", KeyAction::EditUser),
    ("d", KeyAction::DeleteUser),
    ("Delete", KeyAction::DeleteUser),
    ("?", KeyAction::ToggleKeybindsPane),
    ("K", KeyAction::ToggleKeybindsPane),
    ("Up", KeyAction::MoveUp),
    ("Down", KeyAction::MoveDown),
    ("k", KeyAction::MoveUp),
    ("j", KeyAction::MoveDown),
    ("PageUp", KeyAction::PageUp),
    ("PageDown", KeyAction::PageDown),
    ("h", KeyAction::PageUp),
    ("l", KeyAction::PageDown),
    ("Ctrl+c", KeyAction::Quit),
];

/// Maps `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    pub fn new_defaults() -> Self {
        let bindings = DEFAULTS
            .iter()
            .filter_map(|(spec, action)| parse_key(spec).map(|key| (key, *action)))
            .collect();
        Self { bindings }
    }

    /// Load `path`, falling back to the config directory, else write defaults to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = crate::app::config_file_read_path("keybinds.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path, error = %e, "could not write keybindings");
        }
        km
    }

    /// Parse `<Action> = <KeySpec>` lines on top of the defaults.
    ///
    /// Returns `None` when the file cannot be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for (lhs, rhs) in crate::app::config::key_values(contents) {
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrapi-manager keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Backspace, Up, Down, PageUp, PageDown, Delete, ?\n");
        let names: Vec<&str> = ACTIONS.iter().map(|(_, name)| *name).collect();
        let _ = writeln!(&mut buf, "# Actions: {}\n", names.join(", "));

        let mut lines: Vec<(String, &str)> = self
            .bindings
            .iter()
            .map(|((mods, code), action)| (Self::format_key(*mods, *code), format_action(*action)))
            .collect();
        lines.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        for (key, action) in lines {
            let _ = writeln!(&mut buf, "{action} = {key}");
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .get(&(key.modifiers, key.code))
            .or_else(|| {
                // Terminals disagree on whether uppercase letters carry SHIFT.
                match key.code {
                    KeyCode::Char(_) if key.modifiers == KeyModifiers::SHIFT => {
                        self.bindings.get(&(KeyModifiers::NONE, key.code))
                    }
                    _ => None,
                }
            })
            .copied()
    }

    /// Keys bound to `action`, formatted and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys
    }

    /// Format a key like "Ctrl+q" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        let base = match code {
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}"),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{base}")
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => KeyCode::Enter,
        "Delete" => KeyCode::Delete,
        "Backspace" => KeyCode::Backspace,
        "Esc" | "Escape" => KeyCode::Esc,
        "Tab" => KeyCode::Tab,
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    ACTIONS
        .iter()
        .find(|(_, name)| *name == s.trim())
        .map(|(action, _)| *action)
}

pub fn format_action(a: KeyAction) -> &'static str {
    ACTIONS
        .iter()
        .find(|(action, _)| *action == a)
        .map(|(_, name)| *name)
        .unwrap_or("Ignore")
}
