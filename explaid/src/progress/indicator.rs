//! The progress indicator background task.
//!
//! An indicator is a small state machine, `Init → Running → Finished`:
//!
//! - **Init**: reserve the box's vertical space with a placeholder.
//! - **Running**: redraw the box with the next spinner frame every
//!   interval, moving the cursor up and overwriting the previous box.
//! - **Finished**: on cancellation, draw exactly one box with the finished
//!   marker and terminate.
//!
//! [`ProgressIndicator::start`] returns only after the first frame is on
//! screen, so stage work never starts before its indicator.
//! [`ProgressHandle::finish`] returns only after the finished box is on
//! screen, so the stage's output is never consumed before that.

use super::spinner::{SpinnerSequence, FRAME_INTERVAL};
use crate::cancellation::{CancellationToken, SupervisedTask};
use crate::errors::{ExplaidError, RenderingError};
use crate::events::{EventSink, NoOpEventSink, PipelineEvent};
use crate::terminal::{ansi, box_width, render_box, CursorGuard, ProgressMarker, Terminal, BOX_HEIGHT};
use crossterm::cursor::MoveUp;
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Lines the cursor moves up to redraw a box over the previous one.
const BOX_REDRAW_LINES: u16 = 2;

/// Lifecycle state of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorState {
    /// Constructed, placeholder being written.
    Init,
    /// Animating.
    Running,
    /// Final box drawn; terminated.
    Finished,
}

/// What an indicator did during its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorReport {
    /// The stage label.
    pub label: String,
    /// States entered, in order.
    pub transitions: Vec<IndicatorState>,
    /// Spinner frames drawn while running.
    pub frames_drawn: usize,
    /// Finished boxes drawn (1 after a clean finish).
    pub finished_boxes: usize,
}

impl IndicatorReport {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            transitions: vec![IndicatorState::Init],
            frames_drawn: 0,
            finished_boxes: 0,
        }
    }

    /// The state the indicator ended in.
    #[must_use]
    pub fn final_state(&self) -> IndicatorState {
        self.transitions.last().copied().unwrap_or(IndicatorState::Init)
    }
}

/// Builder for a progress indicator.
pub struct ProgressIndicator {
    label: String,
    icon: String,
    terminal: Terminal,
    interval: Duration,
    events: Arc<dyn EventSink>,
}

impl ProgressIndicator {
    /// Creates an indicator for a stage.
    pub fn new(label: impl Into<String>, icon: impl Into<String>, terminal: Terminal) -> Self {
        Self {
            label: label.into(),
            icon: icon.into(),
            terminal,
            interval: FRAME_INTERVAL,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the redraw interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Checks that the box fits into the terminal.
    pub fn check_fits(&self) -> Result<(), RenderingError> {
        let required = box_width(&self.label);
        match self.terminal.width() {
            Some(available) if self.terminal.is_interactive() && required > available => {
                Err(RenderingError::TooNarrow {
                    label: self.label.clone(),
                    required,
                    available,
                })
            }
            _ => Ok(()),
        }
    }

    /// Starts the indicator and waits until it is running.
    ///
    /// `cursor` is the run's cursor guard; the indicator owns it until it
    /// finishes and hands it back through [`ProgressHandle::finish`]. If the
    /// indicator fails, the guard is dropped and the cursor restored before
    /// this returns.
    pub async fn start(self, cursor: Option<CursorGuard>) -> Result<ProgressHandle, ExplaidError> {
        self.check_fits()?;

        let label = self.label.clone();
        let (started_tx, started_rx) = oneshot::channel();
        let task = SupervisedTask::spawn(format!("indicator:{label}"), move |token| {
            self.run(token, cursor, started_tx)
        });

        if started_rx.await.is_err() {
            // The task ended before drawing its first frame; surface why.
            let exit = task.join().await?;
            drop(exit.cursor);
            return Err(exit
                .error
                .map_or_else(
                    || ExplaidError::Internal(format!("indicator '{label}' stopped before running")),
                    |e| RenderingError::Output(e).into(),
                ));
        }

        Ok(ProgressHandle { label, task })
    }

    async fn run(
        self,
        token: Arc<CancellationToken>,
        cursor: Option<CursorGuard>,
        started: oneshot::Sender<()>,
    ) -> IndicatorExit {
        let mut report = IndicatorReport::new(&self.label);
        let result = if self.terminal.is_interactive() {
            self.animate(&token, &mut report, started).await
        } else {
            self.wait_plain(&token, &mut report, started).await
        };

        if let Err(e) = &result {
            debug!(label = %self.label, error = %e, "indicator failed");
        } else {
            self.events.emit(&PipelineEvent::IndicatorFinished {
                label: self.label.clone(),
                frames_drawn: report.frames_drawn,
            });
        }

        IndicatorExit {
            report,
            cursor,
            error: result.err(),
        }
    }

    async fn animate(
        &self,
        token: &CancellationToken,
        report: &mut IndicatorReport,
        started: oneshot::Sender<()>,
    ) -> io::Result<()> {
        // Reserve the lines the box will occupy so the first redraw can move
        // up over them like every later one.
        self.terminal.write_str(&"\n".repeat(BOX_HEIGHT - 1))?;

        let mut spinner = SpinnerSequence::new();
        let mut started = Some(started);

        self.enter_running(report);
        while !token.is_cancelled() {
            let frame = spinner.next_frame();
            self.draw(ProgressMarker::Frame(frame))?;
            report.frames_drawn += 1;

            if let Some(tx) = started.take() {
                let _ = tx.send(());
            }

            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        self.draw(ProgressMarker::Finished)?;
        self.terminal.write_str("\n")?;
        self.enter_finished(report);
        Ok(())
    }

    async fn wait_plain(
        &self,
        token: &CancellationToken,
        report: &mut IndicatorReport,
        started: oneshot::Sender<()>,
    ) -> io::Result<()> {
        self.enter_running(report);
        let _ = started.send(());

        token.cancelled().await;

        let finished = render_box(&self.label, &self.icon, ProgressMarker::Finished);
        self.terminal.write_line(&finished)?;
        self.enter_finished(report);
        Ok(())
    }

    fn draw(&self, marker: ProgressMarker<'_>) -> io::Result<()> {
        let frame = render_box(&self.label, &self.icon, marker);
        // One locked write per box: cursor-up, carriage return, then the box.
        let up = ansi(MoveUp(BOX_REDRAW_LINES));
        self.terminal.write_str(&format!("{up}\r{frame}"))
    }

    fn enter_running(&self, report: &mut IndicatorReport) {
        report.transitions.push(IndicatorState::Running);
        self.events.emit(&PipelineEvent::IndicatorRunning {
            label: self.label.clone(),
        });
    }

    fn enter_finished(&self, report: &mut IndicatorReport) {
        report.transitions.push(IndicatorState::Finished);
        report.finished_boxes += 1;
        debug!(label = %self.label, frames = report.frames_drawn, "indicator finished");
    }
}

impl std::fmt::Debug for ProgressIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressIndicator")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .field("interval", &self.interval)
            .finish()
    }
}

struct IndicatorExit {
    report: IndicatorReport,
    cursor: Option<CursorGuard>,
    error: Option<io::Error>,
}

/// Handle to a running indicator.
///
/// Owned by whoever started the indicator. [`finish`](Self::finish)
/// consumes it, so the handle cannot be used after the indicator is done.
#[derive(Debug)]
pub struct ProgressHandle {
    label: String,
    task: SupervisedTask<IndicatorExit>,
}

impl ProgressHandle {
    /// The stage label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signals the indicator to finish. Signalling twice is a no-op.
    pub fn cancel(&self) {
        self.task.cancel("stage completed");
    }

    /// Signals the indicator and waits until its finished box is drawn.
    ///
    /// Returns the report and the cursor guard handed to
    /// [`ProgressIndicator::start`]. On a drawing failure the guard is
    /// dropped, restoring the cursor, before the error is returned.
    pub async fn finish(self) -> Result<(IndicatorReport, Option<CursorGuard>), ExplaidError> {
        let exit = self.task.finish("stage completed").await?;
        match exit.error {
            None => Ok((exit.report, exit.cursor)),
            Some(e) => {
                drop(exit.cursor);
                Err(RenderingError::Output(e).into())
            }
        }
    }
}

impl std::fmt::Debug for IndicatorExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorExit")
            .field("report", &self.report)
            .field("has_cursor", &self.cursor.is_some())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::terminal::{strip_ansi, FINISHED_GLYPH};
    use crate::testing::{CaptureBuffer, FailingWriter, CURSOR_HIDE, CURSOR_SHOW, CURSOR_UP_TWO};
    use pretty_assertions::assert_eq;

    fn interactive() -> (Terminal, CaptureBuffer) {
        let buffer = CaptureBuffer::new();
        (Terminal::from_writer(buffer.clone(), true, Some(120)), buffer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_transitions_once() {
        let (terminal, _buffer) = interactive();
        let handle = ProgressIndicator::new("Preprocessing", "⚙", terminal)
            .start(None)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let (report, cursor) = handle.finish().await.unwrap();

        assert!(cursor.is_none());
        assert_eq!(
            report.transitions,
            vec![IndicatorState::Init, IndicatorState::Running, IndicatorState::Finished]
        );
        assert_eq!(report.finished_boxes, 1);
        assert!(report.frames_drawn >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame_drawn_before_start_returns() {
        let (terminal, buffer) = interactive();
        let handle = ProgressIndicator::new("Load", "⚙", terminal)
            .start(None)
            .await
            .unwrap();

        let out = buffer.contents();
        assert!(out.starts_with("\n\n"));
        assert!(out.contains(CURSOR_UP_TWO));
        assert!(strip_ansi(&out).contains("⠋ running"));

        handle.finish().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_sleep_draws_single_finished_box() {
        let (terminal, buffer) = interactive();
        let handle = ProgressIndicator::new("Load", "⚙", terminal)
            .with_interval(Duration::from_secs(10))
            .start(None)
            .await
            .unwrap();

        // The indicator is now suspended in its sleep.
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
        handle.cancel();
        let (report, _) = handle.finish().await.unwrap();

        let out = strip_ansi(&buffer.contents());
        assert_eq!(out.matches(FINISHED_GLYPH).count(), 1);
        assert_eq!(report.frames_drawn, 1);

        // The last box written is the finished one, followed by a newline.
        let last_box = out.rsplit('\r').next().unwrap();
        assert!(last_box.contains("✔ done"));
        assert!(!last_box.contains("running"));
        assert!(last_box.ends_with('\n'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_guard_round_trips() {
        let (terminal, buffer) = interactive();
        let guard = CursorGuard::acquire(&terminal).unwrap();

        let handle = ProgressIndicator::new("Load", "⚙", terminal.clone())
            .start(Some(guard))
            .await
            .unwrap();
        let (_, cursor) = handle.finish().await.unwrap();

        assert_eq!(buffer.count(CURSOR_SHOW), 0);
        cursor.unwrap().release().unwrap();
        assert_eq!(buffer.count(CURSOR_HIDE), 1);
        assert_eq!(buffer.count(CURSOR_SHOW), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_mode_draws_only_finished_box() {
        let buffer = CaptureBuffer::new();
        let terminal = Terminal::from_writer(buffer.clone(), false, None);
        let handle = ProgressIndicator::new("Load", "⚙", terminal)
            .start(None)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        let (report, _) = handle.finish().await.unwrap();

        let out = buffer.contents();
        assert!(!out.contains(CURSOR_UP_TWO));
        assert_eq!(strip_ansi(&out).lines().count(), BOX_HEIGHT);
        assert_eq!(report.frames_drawn, 0);
        assert_eq!(report.final_state(), IndicatorState::Finished);
    }

    #[tokio::test]
    async fn test_too_narrow_terminal_is_rejected() {
        let buffer = CaptureBuffer::new();
        let terminal = Terminal::from_writer(buffer.clone(), true, Some(10));

        let err = ProgressIndicator::new("Preprocessing", "⚙", terminal)
            .start(None)
            .await
            .unwrap_err();

        assert!(matches!(err, ExplaidError::Rendering(RenderingError::TooNarrow { .. })));
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_restores_cursor() {
        let buffer = CaptureBuffer::new();
        let terminal = Terminal::from_writer(buffer.clone(), true, None);
        let guard = CursorGuard::acquire(&terminal).unwrap();

        let failing = Terminal::from_writer(FailingWriter, true, None);
        let err = ProgressIndicator::new("Load", "⚙", failing)
            .start(Some(guard))
            .await
            .unwrap_err();

        assert!(matches!(err, ExplaidError::Rendering(RenderingError::Output(_))));
        assert_eq!(buffer.count(CURSOR_SHOW), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_running_and_finished_events() {
        let (terminal, _) = interactive();
        let sink = Arc::new(CollectingEventSink::new());
        let handle = ProgressIndicator::new("Load", "⚙", terminal)
            .with_event_sink(sink.clone())
            .start(None)
            .await
            .unwrap();
        handle.finish().await.unwrap();

        assert_eq!(sink.event_types(), vec!["indicator.running", "indicator.finished"]);
    }
}
