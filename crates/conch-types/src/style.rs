//! Styled text lines.
//!
//! The console core only attaches styles; turning them into terminal output
//! is the renderer's job. `to_ansi` is provided for plain ANSI terminals.

use std::fmt;

/// One of the eight basic ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    /// ANSI SGR foreground code (30-37).
    fn fg_code(self) -> u8 {
        match self {
            Self::Black => 30,
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Blue => 34,
            Self::Magenta => 35,
            Self::Cyan => 36,
            Self::White => 37,
        }
    }
}

/// Text attributes for a [`StyledLine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub foreground: Option<Color>,
    pub bold: bool,
}

impl Style {
    /// No attributes.
    pub const DEFAULT: Style = Style {
        foreground: None,
        bold: false,
    };

    /// Builder-style foreground setter.
    pub fn foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    /// Builder-style bold setter.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// True if the style carries no attributes.
    pub fn is_plain(&self) -> bool {
        self.foreground.is_none() && !self.bold
    }
}

/// A single line of text with one style applied to the whole line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyledLine {
    pub text: String,
    pub style: Style,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Unstyled line.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::DEFAULT)
    }

    /// Line rendered in the error style (red foreground).
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Style::DEFAULT.foreground(Color::Red))
    }

    /// True if this line uses the error style.
    pub fn is_error(&self) -> bool {
        self.style.foreground == Some(Color::Red)
    }

    /// Render with ANSI SGR escapes. Plain lines are returned untouched.
    pub fn to_ansi(&self) -> String {
        if self.style.is_plain() {
            return self.text.clone();
        }
        let mut codes = Vec::new();
        if self.style.bold {
            codes.push("1".to_string());
        }
        if let Some(color) = self.style.foreground {
            codes.push(color.fg_code().to_string());
        }
        format!("\x1b[{}m{}\x1b[0m", codes.join(";"), self.text)
    }
}

impl fmt::Display for StyledLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for StyledLine {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for StyledLine {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}
