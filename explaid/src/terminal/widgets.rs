//! Result display widgets: a line-numbered code excerpt and a message bubble.

use super::color::{colored, COLOR_BORDER};
use std::collections::BTreeMap;

/// Width of a message bubble's text area when none is configured.
pub const DEFAULT_BUBBLE_WIDTH: usize = 60;

/// Minimum number of text lines in a bubble.
pub const BUBBLE_MIN_LINES: usize = 2;

/// Renders numbered source lines with a right-aligned gutter.
///
/// ```text
///  3 │ :- a, b.
/// 12 │ :- not c.
/// ```
#[must_use]
pub fn render_code_excerpt(lines: &BTreeMap<usize, String>) -> String {
    let Some(last) = lines.keys().next_back() else {
        return String::new();
    };
    let gutter = last.to_string().len();
    let divider = colored("│", COLOR_BORDER);

    lines
        .iter()
        .map(|(number, content)| {
            let number = colored(&format!("{number:>gutter$}"), COLOR_BORDER);
            format!("{number} {divider} {}", content.trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits `text` into segments of exactly `width` characters.
///
/// Splitting counts raw characters and ignores word boundaries, so words may
/// be cut in half. Line breaks are flattened to spaces. The last segment is
/// padded with spaces and at least [`BUBBLE_MIN_LINES`] segments are
/// returned.
#[must_use]
pub fn wrap_segments(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let mut segments: Vec<String> = chars
        .chunks(width)
        .map(|chunk| {
            let segment: String = chunk.iter().collect();
            format!("{segment:<width$}")
        })
        .collect();

    while segments.len() < BUBBLE_MIN_LINES {
        segments.push(" ".repeat(width));
    }
    segments
}

/// Renders `text` inside a bordered bubble `width` characters wide.
#[must_use]
pub fn render_bubble(text: &str, width: usize) -> String {
    let segments = wrap_segments(text, width);
    let inner = segments.first().map_or(width, |s| s.chars().count());
    let divider = colored("│", COLOR_BORDER);

    let mut out = Vec::with_capacity(segments.len() + 2);
    out.push(colored(&format!("┌{}┐", "─".repeat(inner + 2)), COLOR_BORDER));
    for segment in &segments {
        out.push(format!("{divider} {segment} {divider}"));
    }
    out.push(colored(&format!("└{}┘", "─".repeat(inner + 2)), COLOR_BORDER));
    out.join("\n")
}
