//! The shared output stream.

use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

/// Handle to the single output stream shared by indicators and the
/// final result display.
///
/// Every write takes the lock for the whole chunk and flushes before
/// releasing it, so a progress box is never interleaved with other output.
/// Clones share the same stream.
#[derive(Clone)]
pub struct Terminal {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    interactive: bool,
    width: Option<usize>,
}

impl Terminal {
    /// Wraps the process's stdout, probing interactivity and width.
    #[must_use]
    pub fn stdout() -> Self {
        let interactive = io::stdout().is_terminal();
        let width = if interactive {
            crossterm::terminal::size().ok().map(|(cols, _)| usize::from(cols))
        } else {
            None
        };
        Self::from_writer(io::stdout(), interactive, width)
    }

    /// Wraps the process's stderr for plain diagnostic lines.
    #[must_use]
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr(), false, None)
    }

    /// Wraps an arbitrary writer.
    pub fn from_writer(writer: impl Write + Send + 'static, interactive: bool, width: Option<usize>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            interactive,
            width,
        }
    }

    /// Whether the stream is a terminal that supports in-place redraws.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// The terminal width in columns, if known.
    #[must_use]
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Writes `text` and flushes while holding the stream.
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }

    /// Writes `text` followed by a newline.
    pub fn write_line(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("interactive", &self.interactive)
            .field("width", &self.width)
            .finish()
    }
}
