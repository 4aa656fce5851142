//! Progress box rendering.
//!
//! A progress box has three columns: a fixed-width icon column, the stage
//! label, and a fixed-width progress column holding either the live spinner
//! frame or the finished marker:
//!
//! ```text
//! ┌────┬───────────────┬─────────────┐
//! │ ⚙  │ Preprocessing │ ⠋ running   │
//! └────┴───────────────┴─────────────┘
//! ```
//!
//! The box is returned without a trailing newline so that the indicator can
//! move the cursor up two lines and redraw it in place.

use super::color::{colored, pad_to, visible_width, COLOR_BORDER, COLOR_FINISHED, COLOR_SPINNER};

/// Display width of the icon column's content.
pub const ICON_COLUMN_WIDTH: usize = 2;

/// Display width of the progress column's content.
pub const PROGRESS_COLUMN_WIDTH: usize = 11;

/// Glyph shown once a stage has finished.
pub const FINISHED_GLYPH: &str = "✔";

/// Number of lines a rendered box occupies.
pub const BOX_HEIGHT: usize = 3;

/// What the progress column shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMarker<'a> {
    /// A live spinner frame.
    Frame(&'a str),
    /// The fixed finished marker.
    Finished,
}

impl ProgressMarker<'_> {
    fn cell(self) -> String {
        match self {
            Self::Frame(frame) => colored(&format!("{frame} running"), COLOR_SPINNER),
            Self::Finished => colored(&format!("{FINISHED_GLYPH} done"), COLOR_FINISHED),
        }
    }
}

/// Total display width of a box for `label`.
#[must_use]
pub fn box_width(label: &str) -> usize {
    // Four borders plus one space of padding on each side of three columns.
    4 + 6 + ICON_COLUMN_WIDTH + visible_width(label) + PROGRESS_COLUMN_WIDTH
}

/// Draws a progress box.
#[must_use]
pub fn render_box(label: &str, icon: &str, marker: ProgressMarker<'_>) -> String {
    let label_width = visible_width(label);
    let rule = |left: &str, mid: &str, right: &str| {
        colored(
            &format!(
                "{left}{}{mid}{}{mid}{}{right}",
                "─".repeat(ICON_COLUMN_WIDTH + 2),
                "─".repeat(label_width + 2),
                "─".repeat(PROGRESS_COLUMN_WIDTH + 2),
            ),
            COLOR_BORDER,
        )
    };
    let divider = colored("│", COLOR_BORDER);

    let upper = rule("┌", "┬", "┐");
    let middle = format!(
        "{divider} {} {divider} {label} {divider} {} {divider}",
        pad_to(icon, ICON_COLUMN_WIDTH),
        pad_to(&marker.cell(), PROGRESS_COLUMN_WIDTH),
    );
    let lower = rule("└", "┴", "┘");

    format!("{upper}\n{middle}\n{lower}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SpinnerSequence;
    use crate::terminal::color::strip_ansi;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_box_layout() {
        let rendered = strip_ansi(&render_box("Load", "⚙", ProgressMarker::Frame("⠋")));
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), BOX_HEIGHT);
        assert_eq!(lines[0], "┌────┬──────┬─────────────┐");
        assert_eq!(lines[1], "│ ⚙  │ Load │ ⠋ running   │");
        assert_eq!(lines[2], "└────┴──────┴─────────────┘");
    }

    #[test]
    fn test_finished_box_layout() {
        let rendered = strip_ansi(&render_box("Load", "⚙", ProgressMarker::Finished));
        assert_eq!(rendered.lines().nth(1), Some("│ ⚙  │ Load │ ✔ done      │"));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_frame_and_finished_have_same_width() {
        for label in ["", "Preprocessing", "Prompting LLM", "Ünïcödé"] {
            let finished = render_box(label, "⚙", ProgressMarker::Finished);
            let mut spinner = SpinnerSequence::new();
            for _ in 0..spinner.cycle_len() {
                let frame = render_box(label, "⚙", ProgressMarker::Frame(spinner.next_frame()));
                for (a, b) in frame.lines().zip(finished.lines()) {
                    assert_eq!(visible_width(a), visible_width(b));
                }
            }
        }
    }

    #[test]
    fn test_box_width_matches_rendering() {
        let label = "Extracting constraints";
        let rendered = render_box(label, "⚙", ProgressMarker::Finished);
        for line in rendered.lines() {
            assert_eq!(visible_width(line), box_width(label));
        }
    }

    #[test]
    fn test_box_uses_border_and_spinner_colors() {
        let rendered = render_box("Load", "⚙", ProgressMarker::Frame("⠋"));
        assert!(rendered.starts_with("\x1b[38;2;100;100;100m┌"));
        assert!(rendered.contains("\x1b[38;2;30;136;229m⠋ running\x1b[0m"));
    }
}
