//! Console colors

use std::fmt::Display;

/// Color of a console fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// separators
    Gray,
    /// failures
    Red,
    /// successes
    Green,
    /// headlines
    Blue,
    /// failure messages
    Purple,
}

impl Style {
    fn code(self) -> &'static str {
        match self {
            Style::Gray => "\x1b[90m",
            Style::Red => "\x1b[31;1m",
            Style::Green => "\x1b[32;1m",
            Style::Blue => "\x1b[34;1m",
            Style::Purple => "\x1b[36m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Palette wraps text in ANSI escapes, or passes it through when disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// New a palette; `enabled == false` renders plain text.
    pub fn new(enabled: bool) -> Self {
        Palette { enabled }
    }

    /// Plain text palette.
    pub fn plain() -> Self {
        Palette::new(false)
    }

    /// Render `text` in `style`.
    pub fn paint(&self, style: Style, text: impl Display) -> String {
        if self.enabled {
            format!("{}{}{}", style.code(), text, RESET)
        } else {
            text.to_string()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::new(true)
    }
}
