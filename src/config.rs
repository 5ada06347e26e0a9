// config.rs

use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

pub const MAX_LINE: usize = 1000;
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EditorMode {
    Auto,
    Off,
}

#[derive(Debug, Error)]
#[error("unknown editor mode `{0}` (expected `auto` or `off`)")]
pub struct BadEditorMode(String);

impl FromStr for EditorMode {
    type Err = BadEditorMode;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" | "" => Ok(EditorMode::Auto),
            "off" => Ok(EditorMode::Off),
            other => Err(BadEditorMode(other.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub history_capacity: usize,
    pub editor: EditorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            editor: EditorMode::Auto,
        }
    }
}

impl Config {
    /// Reads `TINYSH_HISTSIZE` and `TINYSH_EDITOR`; bad values fall back to
    /// the defaults with a warning. A history size must lie in
    /// `1..=MAX_HISTORY_CAPACITY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Config::default();
        if let Some(raw) = lookup("TINYSH_HISTSIZE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if (1..=MAX_HISTORY_CAPACITY).contains(&n) => {
                    config.history_capacity = n
                }
                _ => warn!(value = %raw, "ignoring invalid TINYSH_HISTSIZE"),
            }
        }
        if let Some(raw) = lookup("TINYSH_EDITOR") {
            match raw.parse() {
                Ok(mode) => config.editor = mode,
                Err(e) => warn!("ignoring TINYSH_EDITOR: {}", e),
            }
        }
        config
    }
}
