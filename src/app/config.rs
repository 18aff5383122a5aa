//! Application settings: parse/write `config.conf`.
//!
//! The file uses the same `key = value` format as `theme.conf` and
//! `keybinds.conf`. Command-line flags and environment variables override
//! whatever the file says (see `main.rs`).

use std::path::PathBuf;

use crate::store::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_LOG_FILE: &str = "usrapi-manager.log";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the users API, without the `/users` suffix.
    pub api_url: String,
    pub page_size: u32,
    pub log_file: PathBuf,
    pub theme_file: PathBuf,
    pub keybinds_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            theme_file: PathBuf::from("theme.conf"),
            keybinds_file: PathBuf::from("keybinds.conf"),
        }
    }
}

impl AppConfig {
    /// Load `path`, falling back to the config directory, else write defaults to `path`.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        if let Some(existing) = super::config_file_read_path("config.conf") {
            return Self::from_file(&existing.to_string_lossy()).unwrap_or_default();
        }
        let cfg = Self::default();
        if let Err(e) = cfg.write_file(path) {
            tracing::warn!(path, error = %e, "could not write default config");
        }
        cfg
    }

    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Unknown keys and unparseable values are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for (key, value) in key_values(contents) {
            match key {
                "api_url" => cfg.api_url = value.to_string(),
                "page_size" => {
                    if let Ok(n) = value.parse::<u32>() {
                        if n > 0 {
                            cfg.page_size = n;
                        }
                    }
                }
                "log_file" => cfg.log_file = PathBuf::from(value),
                "theme_file" => cfg.theme_file = PathBuf::from(value),
                "keybinds_file" => cfg.keybinds_file = PathBuf::from(value),
                _ => {}
            }
        }
        cfg
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        let buf = format!(
            "# usrapi-manager settings\n\
             # Flags and USRAPI_* environment variables take precedence.\n\n\
             api_url = {}\n\
             page_size = {}\n\
             log_file = {}\n\
             theme_file = {}\n\
             keybinds_file = {}\n",
            self.api_url,
            self.page_size,
            self.log_file.display(),
            self.theme_file.display(),
            self.keybinds_file.display(),
        );
        std::fs::write(path, buf)
    }
}

/// Non-empty `key = value` pairs of a config file; comments and blank lines skipped.
pub fn key_values(contents: &str) -> impl Iterator<Item = (&str, &str)> {
    contents.lines().filter_map(|raw| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (lhs, rhs) = line.split_once('=')?;
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        if lhs.is_empty() || rhs.is_empty() {
            None
        } else {
            Some((lhs, rhs))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_known_keys_and_ignores_noise() {
        let cfg = AppConfig::parse(
            "# comment\napi_url = https://api.example.com/v1\npage_size = 25\nunknown = 1\nlog_file=\n",
        );
        assert_eq!(cfg.api_url, "https://api.example.com/v1");
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn zero_or_garbage_page_size_keeps_default() {
        assert_eq!(AppConfig::parse("page_size = 0").page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(AppConfig::parse("page_size = lots").page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn key_values_splits_on_first_equals() {
        let pairs: Vec<_> = key_values("a = b=c\n = x\n# c = d\nk =\n").collect();
        assert_eq!(pairs, vec![("a", "b=c")]);
    }
}
