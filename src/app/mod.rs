//! Application state types and entry glue.
//!
//! Defines the screens, modal dialogs and theme of the TUI together with
//! [`AppState`], which owns the users store. Key handling and the event
//! loop live in [`update`] (re-exported as `run`).
//!
pub mod config;
pub mod dispatch;
pub mod form;
pub mod keymap;
pub mod update;

use std::collections::HashMap;
use std::path::PathBuf;

use ratatui::style::Color;

use crate::api::PhotoStatus;
use crate::store::{Request, UsersStore};
use form::UserForm;

/// One entry of the navigation stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    UserList,
    UserDetails { id: String },
    UserForm,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::UserList => "User List",
            Screen::UserDetails { .. } => "User Details",
            Screen::UserForm => "User Form",
        }
    }
}

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Keys go to the form.
    Editing,
    Modal,
}

/// Modal dialogs drawn over the current screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    DeleteConfirm { id: String, name: String, selected: usize },
    GenderPicker { selected: usize },
    /// Blocking notification; any key closes it.
    Info { title: String, message: String },
}

/// Side effects requested by key handling, performed by the event loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Request(Request),
    ProbePhoto(String),
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::Red,
        }
    }

    /// Catppuccin Mocha.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    fn slots(&mut self) -> [(&'static str, &mut Color); 11] {
        [
            ("text", &mut self.text),
            ("muted", &mut self.muted),
            ("title", &mut self.title),
            ("border", &mut self.border),
            ("header_bg", &mut self.header_bg),
            ("header_fg", &mut self.header_fg),
            ("status_bg", &mut self.status_bg),
            ("status_fg", &mut self.status_fg),
            ("highlight_fg", &mut self.highlight_fg),
            ("highlight_bg", &mut self.highlight_bg),
            ("error", &mut self.error),
        ]
    }

    /// Parse `key = color` lines on top of `mocha`.
    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for (key, value) in config::key_values(contents) {
            let Some(color) = Self::parse_color(value) else { continue };
            if let Some((_, slot)) = theme.slots().into_iter().find(|(name, _)| *name == key) {
                *slot = color;
            }
        }
        theme
    }

    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Hex ("#RRGGBB" or "RRGGBB"), "reset", or a named color ("blue", "darkgray").
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(&lower);
        if hex.len() == 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        lower.parse::<Color>().ok()
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{r:02X}{g:02X}{b:02X}"),
            Color::Reset => "reset".to_string(),
            named => named.to_string().to_ascii_lowercase(),
        }
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrapi-manager theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut copy = *self;
        for (key, color) in copy.slots() {
            let _ = writeln!(&mut buf, "{key} = {}", Self::color_to_str(*color));
        }
        std::fs::write(path, buf)
    }

    /// Load `path`; when missing, write the default theme there and return it.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        if let Some(existing) = config_file_read_path("theme.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(path) {
            tracing::warn!(path, error = %e, "could not write theme");
        }
        t
    }
}

/// `$XDG_CONFIG_HOME/usrapi-manager` or `~/.config/usrapi-manager`.
pub fn config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join("usrapi-manager"))
}

/// Existing config file `name` inside [`config_dir`], if any.
pub fn config_file_read_path(name: &str) -> Option<PathBuf> {
    let p = config_dir()?.join(name);
    p.exists().then_some(p)
}

pub struct AppState {
    pub store: UsersStore,
    /// Navigation stack; never empty, the list is at the bottom.
    pub screens: Vec<Screen>,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub theme: Theme,
    pub keymap: keymap::Keymap,
    pub modal: Option<ModalState>,
    pub form: Option<UserForm>,
    pub photos: HashMap<String, PhotoStatus>,
    pub show_keybinds: bool,
    pub api_url: String,
    /// Effects queued by key handling for the event loop.
    pub outbox: Vec<Effect>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(store: UsersStore, theme: Theme, keymap: keymap::Keymap, api_url: impl Into<String>) -> Self {
        Self {
            store,
            screens: vec![Screen::UserList],
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            theme,
            keymap,
            modal: None,
            form: None,
            photos: HashMap::new(),
            show_keybinds: false,
            api_url: api_url.into(),
            outbox: Vec::new(),
            should_quit: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screens.last().cloned().unwrap_or(Screen::UserList)
    }

    /// Status of the photo at `url`; empty or absent URLs are `Missing`.
    pub fn photo_status(&self, url: Option<&str>) -> PhotoStatus {
        match url.filter(|u| !u.trim().is_empty()) {
            None => PhotoStatus::Missing,
            Some(u) => self.photos.get(u).copied().unwrap_or(PhotoStatus::Checking),
        }
    }

    /// Queue a reachability check for `url` unless one is known or running.
    pub fn request_photo(&mut self, url: Option<&str>) {
        let Some(u) = url.filter(|u| !u.trim().is_empty()) else { return };
        if !self.photos.contains_key(u) {
            self.photos.insert(u.to_string(), PhotoStatus::Checking);
            self.outbox.push(Effect::ProbePhoto(u.to_string()));
        }
    }

    pub fn request(&mut self, request: Request) {
        self.outbox.push(Effect::Request(request));
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
