//! Testing utilities for explaid pipelines.
//!
//! This module provides:
//! - A capturing output stream and the escape sequences tests look for
//! - Scripted stages with optional delays
//! - Fixed-answer collaborators for the explanation pipeline

mod capture;
mod fakes;
mod stages;

pub use capture::{CaptureBuffer, FailingWriter, CURSOR_HIDE, CURSOR_SHOW, CURSOR_UP_TWO};
pub use fakes::{CannedModel, FixedVerdict, WholeSetCore};
pub use stages::ScriptedStage;

/// Removes ANSI escape sequences from captured output.
#[must_use]
pub fn plain(text: &str) -> String {
    crate::terminal::strip_ansi(text)
}
