//! Terminal output: colors, progress boxes, result widgets, the shared
//! output stream, and the cursor visibility guard.
//!
//! Everything in `color`, `render`, and `widgets` is a pure function of its
//! arguments; only [`Terminal`] and [`CursorGuard`] perform I/O.

mod color;
mod cursor;
mod output;
mod render;
mod widgets;

pub use color::{
    ansi, colored, escape, highlighted, pad_to, reset, strip_ansi, visible_width, ColorTarget, Rgb,
    COLOR_BLUE, COLOR_BORDER, COLOR_FINISHED, COLOR_GRAY, COLOR_GREEN, COLOR_SPINNER,
};
pub use cursor::CursorGuard;
pub use output::Terminal;
pub use render::{
    box_width, render_box, ProgressMarker, BOX_HEIGHT, FINISHED_GLYPH, ICON_COLUMN_WIDTH,
    PROGRESS_COLUMN_WIDTH,
};
pub use widgets::{
    render_bubble, render_code_excerpt, wrap_segments, BUBBLE_MIN_LINES, DEFAULT_BUBBLE_WIDTH,
};
