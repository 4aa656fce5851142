//! Scoped hiding of the terminal cursor.

use super::{ansi, Terminal};
use crossterm::cursor::{Hide, Show};
use std::io;
use tracing::{debug, warn};

/// Keeps the cursor hidden while alive.
///
/// The cursor is hidden on [`acquire`](Self::acquire) and shown again
/// exactly once: either by [`release`](Self::release) or, on every other
/// exit path (early return, error, panic unwinding), by `Drop`.
#[derive(Debug)]
pub struct CursorGuard {
    terminal: Terminal,
    released: bool,
}

impl CursorGuard {
    /// Hides the cursor on `terminal`.
    pub fn acquire(terminal: &Terminal) -> io::Result<Self> {
        terminal.write_str(&ansi(Hide))?;
        debug!("cursor hidden");
        Ok(Self {
            terminal: terminal.clone(),
            released: false,
        })
    }

    /// Shows the cursor again and reports whether that succeeded.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        self.show()
    }

    fn show(&self) -> io::Result<()> {
        self.terminal.write_str(&ansi(Show))?;
        debug!("cursor restored");
        Ok(())
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = self.show() {
                warn!(error = %e, "failed to restore cursor");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CaptureBuffer, CURSOR_HIDE, CURSOR_SHOW};

    fn terminal() -> (Terminal, CaptureBuffer) {
        let buffer = CaptureBuffer::new();
        (Terminal::from_writer(buffer.clone(), true, None), buffer)
    }

    #[test]
    fn test_release_shows_once() {
        let (terminal, buffer) = terminal();
        let guard = CursorGuard::acquire(&terminal).unwrap();
        guard.release().unwrap();

        assert_eq!(buffer.count(CURSOR_HIDE), 1);
        assert_eq!(buffer.count(CURSOR_SHOW), 1);
    }

    #[test]
    fn test_drop_restores_cursor() {
        let (terminal, buffer) = terminal();
        {
            let _guard = CursorGuard::acquire(&terminal).unwrap();
        }

        assert_eq!(buffer.contents(), format!("{CURSOR_HIDE}{CURSOR_SHOW}"));
    }

    #[test]
    fn test_restores_on_panic() {
        let (terminal, buffer) = terminal();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = CursorGuard::acquire(&terminal).unwrap();
            panic!("Intentional");
        }));

        assert!(result.is_err());
        assert_eq!(buffer.count(CURSOR_SHOW), 1);
    }
}
