//! 24-bit color escape sequences and visible-width helpers.

use crossterm::style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::Command;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::Rgb {
            r: rgb.red,
            g: rgb.green,
            b: rgb.blue,
        }
    }
}

/// Which layer a color applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    /// Text color.
    Foreground,
    /// Cell background.
    Background,
}

/// Accent blue.
pub const COLOR_BLUE: Rgb = Rgb::new(30, 136, 229);
/// Muted gray.
pub const COLOR_GRAY: Rgb = Rgb::new(100, 100, 100);
/// Success green.
pub const COLOR_GREEN: Rgb = Rgb::new(67, 160, 71);

/// Color of the live spinner frame.
pub const COLOR_SPINNER: Rgb = COLOR_BLUE;
/// Color of the box borders and the excerpt gutter.
pub const COLOR_BORDER: Rgb = COLOR_GRAY;
/// Color of the finished marker.
pub const COLOR_FINISHED: Rgb = COLOR_GREEN;

static ANSI_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("static ANSI pattern is valid")
});

/// Renders a crossterm command into its ANSI text.
#[must_use]
pub fn ansi(command: impl Command) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = command.write_ansi(&mut out);
    out
}

/// Returns the escape sequence selecting `color` for `target`.
///
/// Produces `ESC[38;2;R;G;Bm` for the foreground and `ESC[48;2;R;G;Bm` for
/// the background.
#[must_use]
pub fn escape(color: Rgb, target: ColorTarget) -> String {
    match target {
        ColorTarget::Foreground => ansi(SetForegroundColor(color.into())),
        ColorTarget::Background => ansi(SetBackgroundColor(color.into())),
    }
}

/// Returns the `ESC[0m` reset sequence.
#[must_use]
pub fn reset() -> String {
    ansi(ResetColor)
}

/// Wraps `text` in a foreground color and a reset.
#[must_use]
pub fn colored(text: &str, color: Rgb) -> String {
    format!("{}{text}{}", escape(color, ColorTarget::Foreground), reset())
}

/// Wraps `text` in a background color and a reset.
#[must_use]
pub fn highlighted(text: &str, color: Rgb) -> String {
    format!("{}{text}{}", escape(color, ColorTarget::Background), reset())
}

/// Removes CSI escape sequences from `text`.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_SEQUENCE.replace_all(text, "").into_owned()
}

/// Display width of `text` in terminal cells, ignoring escape sequences.
#[must_use]
pub fn visible_width(text: &str) -> usize {
    strip_ansi(text).width()
}

/// Pads `text` with spaces up to `width` display cells.
#[must_use]
pub fn pad_to(text: &str, width: usize) -> String {
    let used = visible_width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}
