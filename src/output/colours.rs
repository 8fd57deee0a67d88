//! Colour handling for terminal output
//!
//! Honours `NO_COLOR` and `--no-color`, and disables colours when stdout is
//! not a terminal.

use colored::{ColoredString, Colorize};
use std::io::IsTerminal;

#[derive(Debug, Clone)]
pub struct ColourManager {
    enabled: bool,
}

impl ColourManager {
    /// Detect colour support from the environment
    pub fn new() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::with_colours(!no_color && std::io::stdout().is_terminal())
    }

    /// Create a ColourManager with explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        Self { enabled }
    }

    /// CLI `--no-color` overrides detection
    pub fn from_args(no_color_flag: bool) -> Self {
        if no_color_flag {
            Self::with_colours(false)
        } else {
            Self::new()
        }
    }

    pub fn colours_enabled(&self) -> bool {
        self.enabled
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.red().bold())
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.green())
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> ColoredString {
        if self.enabled {
            style(text)
        } else {
            text.normal()
        }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}
