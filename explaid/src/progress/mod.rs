//! Animated progress boxes for pipeline stages.
//!
//! A [`ProgressIndicator`] is started right before a stage's work and
//! finished right after it. While running it owns the run's
//! [`CursorGuard`](crate::terminal::CursorGuard) and redraws its box in
//! place on the shared [`Terminal`](crate::terminal::Terminal).

mod indicator;
mod spinner;

pub use indicator::{IndicatorReport, IndicatorState, ProgressHandle, ProgressIndicator};
pub use spinner::{Frame, SpinnerSequence, FRAME_INTERVAL, SPINNER_FRAMES};
