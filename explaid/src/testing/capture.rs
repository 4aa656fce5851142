//! In-memory output streams.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Escape sequence that hides the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// Escape sequence that shows the cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Escape sequence that moves the cursor up over a box's first two lines.
pub const CURSOR_UP_TWO: &str = "\x1b[2A";

/// A cloneable writer that records everything written to it.
///
/// Clones share the same buffer, so one clone can be handed to a
/// [`Terminal`](crate::terminal::Terminal) while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Number of non-overlapping occurrences of `needle`.
    #[must_use]
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }

    /// Discards the recorded output.
    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A writer whose every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"))
    }
}
