//! Terminal colors taken from the theme document.

use crate::services::{ThemeDocument, ThemeSection};
use crossterm::style::{Color, Stylize};
use std::io::IsTerminal;

/// Colors for server status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPalette {
    running: Option<Color>,
    stopped: Option<Color>,
}

impl StatusPalette {
    /// Picks the button colors of `theme`; plain output when stdout is not a terminal.
    #[must_use]
    pub fn from_theme(theme: &ThemeDocument) -> Self {
        if !std::io::stdout().is_terminal() {
            return Self::plain();
        }
        Self {
            running: theme
                .get(ThemeSection::Colors, "button_bg")
                .and_then(parse_hex_color),
            stopped: theme
                .get(ThemeSection::Colors, "stop_btn_bg")
                .and_then(parse_hex_color),
        }
    }

    /// No colors at all.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            running: None,
            stopped: None,
        }
    }

    /// Formats a line about a running server.
    #[must_use]
    pub fn running(&self, text: &str) -> String {
        paint(text, self.running)
    }

    /// Formats a line about a stopped server.
    #[must_use]
    pub fn stopped(&self, text: &str) -> String {
        paint(text, self.stopped)
    }
}

fn paint(text: &str, color: Option<Color>) -> String {
    match color {
        Some(color) => text.with(color).bold().to_string(),
        None => text.to_string(),
    }
}

/// Parses `#rrggbb` (or `rrggbb`) into a terminal color.
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(Color::Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            parse_hex_color("#89b4fa"),
            Some(Color::Rgb {
                r: 0x89,
                g: 0xb4,
                b: 0xfa
            })
        );
        assert_eq!(
            parse_hex_color("F38BA8"),
            Some(Color::Rgb {
                r: 0xf3,
                g: 0x8b,
                b: 0xa8
            })
        );
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn test_plain_palette_leaves_text_alone() {
        let palette = StatusPalette::plain();
        assert_eq!(palette.running("Server running"), "Server running");
        assert_eq!(palette.stopped("Server stopped"), "Server stopped");
    }
}
