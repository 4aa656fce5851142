//! The cyclic spinner frame sequence.

use std::time::Duration;

/// A single spinner glyph.
pub type Frame = &'static str;

/// Braille spinner frames.
pub const SPINNER_FRAMES: [Frame; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Delay between two redraws.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(70);

/// An infinite, restartable producer of spinner frames.
///
/// Each instance owns its own position; constructing a new one always
/// starts again at the first frame.
#[derive(Debug, Clone)]
pub struct SpinnerSequence {
    frames: &'static [Frame],
    position: usize,
}

impl SpinnerSequence {
    /// Creates a sequence over [`SPINNER_FRAMES`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_frames(&SPINNER_FRAMES)
    }

    /// Creates a sequence over custom frames.
    ///
    /// An empty list falls back to [`SPINNER_FRAMES`].
    #[must_use]
    pub fn with_frames(frames: &'static [Frame]) -> Self {
        let frames = if frames.is_empty() { &SPINNER_FRAMES[..] } else { frames };
        Self { frames, position: 0 }
    }

    /// Number of frames before the sequence repeats.
    #[must_use]
    pub fn cycle_len(&self) -> usize {
        self.frames.len()
    }

    /// The frame at absolute step `k`, independent of the current position.
    #[must_use]
    pub fn frame(&self, k: usize) -> Frame {
        self.frames[k % self.frames.len()]
    }

    /// Returns the next frame and advances.
    pub fn next_frame(&mut self) -> Frame {
        let frame = self.frame(self.position);
        self.position = (self.position + 1) % self.frames.len();
        frame
    }
}

impl Default for SpinnerSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SpinnerSequence {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        Some(self.next_frame())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_is_cyclic() {
        let n = SPINNER_FRAMES.len();
        let frames: Vec<Frame> = SpinnerSequence::new().take(3 * n).collect();

        for k in 0..2 * n {
            assert_eq!(frames[k], frames[k + n]);
        }
    }

    #[test]
    fn test_new_sequence_restarts() {
        let mut first = SpinnerSequence::new();
        first.next_frame();
        first.next_frame();

        let mut second = SpinnerSequence::new();
        assert_eq!(second.next_frame(), SPINNER_FRAMES[0]);
        assert_eq!(first.next_frame(), SPINNER_FRAMES[2]);
    }

    #[test]
    fn test_frame_by_index() {
        let seq = SpinnerSequence::new();
        assert_eq!(seq.frame(0), seq.frame(seq.cycle_len()));
        assert_eq!(seq.frame(13), SPINNER_FRAMES[3]);
    }

    #[test]
    fn test_custom_frames() {
        static FRAMES: [Frame; 2] = ["-", "|"];
        let frames: Vec<Frame> = SpinnerSequence::with_frames(&FRAMES).take(5).collect();
        assert_eq!(frames, vec!["-", "|", "-", "|", "-"]);
    }

    #[test]
    fn test_empty_frames_fall_back() {
        let seq = SpinnerSequence::with_frames(&[]);
        assert_eq!(seq.cycle_len(), SPINNER_FRAMES.len());
    }

    #[test]
    fn test_frames_are_single_cells() {
        for frame in SPINNER_FRAMES {
            assert_eq!(crate::terminal::visible_width(frame), 1);
        }
    }
}
