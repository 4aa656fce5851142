//! The pipeline orchestrator.
//!
//! Runs stages in strict sequence, each bracketed by its own progress
//! indicator:
//!
//! 1. start the indicator (returns once its first frame is drawn)
//! 2. run the stage against the context
//! 3. finish the indicator (returns once the finished box is drawn)
//! 4. on failure stop; otherwise record the output and continue
//!
//! At most one indicator is alive at any time, and a stage's output is only
//! recorded after its indicator finished. The cursor is hidden once per run
//! and the guard is handed from indicator to indicator, so it is restored
//! exactly once, whichever way the run ends.

use super::outcome::{CompletedRun, PipelineOutcome};
use crate::cancellation::CancellationToken;
use crate::context::{PipelineContext, RunIdentity, StageId};
use crate::errors::{ConfigError, ExplaidError, RenderingError, StageError};
use crate::events::{EventSink, NoOpEventSink, PipelineEvent};
use crate::observability::{RunSpanAttributes, SpanTimer, StageSpanAttributes};
use crate::progress::{IndicatorReport, ProgressIndicator, FRAME_INTERVAL};
use crate::stages::Stage;
use crate::terminal::{CursorGuard, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Label used for errors raised by the pre-check.
pub const PRECHECK_LABEL: &str = "Satisfiability check";

/// Synchronous check run before any stage.
///
/// Returning `true` ends the run early with [`PipelineOutcome::Satisfiable`].
pub trait Precheck<I>: Send + Sync {
    /// Whether the input is satisfiable.
    fn is_satisfiable(&self, input: &I) -> Result<bool, StageError>;
}

impl<I, F> Precheck<I> for F
where
    F: Fn(&I) -> Result<bool, StageError> + Send + Sync,
{
    fn is_satisfiable(&self, input: &I) -> Result<bool, StageError> {
        self(input)
    }
}

/// Writes the run's result to the terminal.
pub trait Presenter<I, O>: Send + Sync {
    /// Called instead of any stage when the pre-check passed.
    fn satisfiable(&self, terminal: &Terminal) -> io::Result<()>;

    /// Called once after the last stage's indicator finished.
    fn completed(&self, context: &PipelineContext<I, O>, terminal: &Terminal) -> io::Result<()>;
}

/// A presenter that writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

impl<I, O> Presenter<I, O> for SilentPresenter {
    fn satisfiable(&self, _terminal: &Terminal) -> io::Result<()> {
        Ok(())
    }

    fn completed(&self, _context: &PipelineContext<I, O>, _terminal: &Terminal) -> io::Result<()> {
        Ok(())
    }
}

/// An ordered list of stages with their supervision.
pub struct Pipeline<I, O> {
    stages: Vec<Arc<dyn Stage<I, O>>>,
    precheck: Option<Arc<dyn Precheck<I>>>,
    presenter: Arc<dyn Presenter<I, O>>,
    terminal: Terminal,
    events: Arc<dyn EventSink>,
    frame_interval: Duration,
    cancellation: Arc<CancellationToken>,
}

impl<I: Send + Sync, O: Send + Sync> Pipeline<I, O> {
    /// Returns a builder writing to `terminal`.
    #[must_use]
    pub fn builder(terminal: Terminal) -> PipelineBuilder<I, O> {
        PipelineBuilder::new(terminal)
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stage labels in order.
    #[must_use]
    pub fn stage_labels(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.label()).collect()
    }

    /// The token that cancels this pipeline's runs.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        self.cancellation.clone()
    }

    /// Runs the pipeline on `input`.
    ///
    /// # Errors
    ///
    /// - [`ExplaidError::Stage`] when the pre-check or a stage fails; the
    ///   failing stage's indicator has finished before this returns
    /// - [`ExplaidError::Rendering`] when a box does not fit or cannot be drawn
    /// - [`ExplaidError::Cancelled`] when the cancellation token fired
    pub async fn run(&self, input: I) -> Result<PipelineOutcome<I, O>, ExplaidError> {
        if let Some(precheck) = &self.precheck {
            let satisfiable = precheck
                .is_satisfiable(&input)
                .map_err(|e| e.in_stage(PRECHECK_LABEL))?;
            self.events.emit(&PipelineEvent::PrecheckCompleted { satisfiable });

            if satisfiable {
                info!("input is satisfiable, no stage runs");
                self.presenter
                    .satisfiable(&self.terminal)
                    .map_err(RenderingError::Output)?;
                return Ok(PipelineOutcome::Satisfiable);
            }
        }

        let mut context = PipelineContext::with_identity(input, RunIdentity::new());
        let run_id = context.identity().to_string();
        let timer = SpanTimer::start("pipeline");

        self.events.emit(&PipelineEvent::PipelineStarted {
            run_id: run_id.clone(),
            stage_count: self.stages.len(),
        });
        info!(run = %context.identity().short(), stages = self.stages.len(), "pipeline started");

        let mut cursor = if self.terminal.is_interactive() {
            Some(CursorGuard::acquire(&self.terminal).map_err(RenderingError::Output)?)
        } else {
            None
        };

        let mut reports = Vec::with_capacity(self.stages.len());
        for (index, stage) in self.stages.iter().enumerate() {
            let report = self
                .run_stage(index, stage.as_ref(), &mut context, &mut cursor)
                .await?;
            reports.push(report);
        }

        self.presenter
            .completed(&context, &self.terminal)
            .map_err(RenderingError::Output)?;
        if let Some(guard) = cursor.take() {
            guard.release().map_err(RenderingError::Output)?;
        }

        let duration_ms = timer.finish();
        let attrs = RunSpanAttributes::new(self.stages.len(), self.terminal.is_interactive())
            .with_run_id(run_id.clone())
            .with_outcome("completed")
            .with_duration_ms(duration_ms);
        debug!(attributes = ?attrs.to_attributes(), "pipeline span");
        self.events
            .emit(&PipelineEvent::PipelineCompleted { run_id, duration_ms });

        Ok(PipelineOutcome::Completed(CompletedRun {
            context,
            reports,
            duration_ms,
        }))
    }

    async fn run_stage(
        &self,
        index: usize,
        stage: &dyn Stage<I, O>,
        context: &mut PipelineContext<I, O>,
        cursor: &mut Option<CursorGuard>,
    ) -> Result<IndicatorReport, ExplaidError> {
        let label = stage.label().to_string();
        if self.cancellation.is_cancelled() {
            return Err(self.cancelled());
        }

        let handle = ProgressIndicator::new(label.as_str(), stage.icon(), self.terminal.clone())
            .with_interval(self.frame_interval)
            .with_event_sink(self.events.clone())
            .start(cursor.take())
            .await?;

        self.events.emit(&PipelineEvent::StageStarted {
            index,
            label: label.clone(),
        });
        let timer = SpanTimer::start(label.as_str());

        let result = tokio::select! {
            biased;
            () = self.cancellation.cancelled() => None,
            result = stage.run(&*context) => Some(result),
        };

        // The output is only looked at once the finished box is on screen.
        let (report, guard) = handle.finish().await?;
        *cursor = guard;

        let attrs = StageSpanAttributes::new(index, label.as_str())
            .with_duration_ms(timer.finish())
            .with_frames_drawn(report.frames_drawn);

        match result {
            None => {
                let err = self.cancelled();
                attrs.with_status("cancelled").with_error(err.to_string()).record();
                Err(err)
            }
            Some(Err(e)) => {
                let e = e.in_stage(&label);
                attrs.with_status("failed").with_error(e.to_string()).record();
                self.events.emit(&PipelineEvent::StageFailed {
                    index,
                    label,
                    error: e.to_string(),
                });
                Err(e.into())
            }
            Some(Ok(output)) => {
                let attrs = attrs.with_status("completed");
                attrs.record();
                self.events.emit(&PipelineEvent::StageCompleted {
                    index,
                    label: label.clone(),
                    duration_ms: attrs.duration_ms.unwrap_or_default(),
                });
                context.record(StageId(index), label, output)?;
                Ok(report)
            }
        }
    }

    fn cancelled(&self) -> ExplaidError {
        let reason = self
            .cancellation
            .reason()
            .unwrap_or_else(|| "cancelled".to_string());
        self.events.emit(&PipelineEvent::PipelineCancelled {
            reason: reason.clone(),
        });
        ExplaidError::Cancelled(reason)
    }
}

impl<I, O> std::fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("has_precheck", &self.precheck.is_some())
            .field("terminal", &self.terminal)
            .field("frame_interval", &self.frame_interval)
            .finish()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<I, O> {
    stages: Vec<Arc<dyn Stage<I, O>>>,
    precheck: Option<Arc<dyn Precheck<I>>>,
    presenter: Arc<dyn Presenter<I, O>>,
    terminal: Terminal,
    events: Arc<dyn EventSink>,
    frame_interval: Duration,
    cancellation: Option<Arc<CancellationToken>>,
}

impl<I: Send + Sync, O: Send + Sync> PipelineBuilder<I, O> {
    /// Creates a builder writing to `terminal`.
    #[must_use]
    pub fn new(terminal: Terminal) -> Self {
        Self {
            stages: Vec::new(),
            precheck: None,
            presenter: Arc::new(SilentPresenter),
            terminal,
            events: Arc::new(NoOpEventSink),
            frame_interval: FRAME_INTERVAL,
            cancellation: None,
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage<I, O>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends several stages.
    #[must_use]
    pub fn stages(mut self, stages: impl IntoIterator<Item = Arc<dyn Stage<I, O>>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Sets the pre-check.
    #[must_use]
    pub fn precheck(mut self, precheck: Arc<dyn Precheck<I>>) -> Self {
        self.precheck = Some(precheck);
        self
    }

    /// Sets the presenter.
    #[must_use]
    pub fn presenter(mut self, presenter: Arc<dyn Presenter<I, O>>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the spinner frame interval.
    #[must_use]
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Uses `token` to cancel runs.
    #[must_use]
    pub fn cancellation_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if no stage was added or the frame interval is zero.
    pub fn build(self) -> Result<Pipeline<I, O>, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::invalid("stages", "pipeline has no stages"));
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::invalid("frame_interval", "must be positive"));
        }

        Ok(Pipeline {
            stages: self.stages,
            precheck: self.precheck,
            presenter: self.presenter,
            terminal: self.terminal,
            events: self.events,
            frame_interval: self.frame_interval,
            cancellation: self
                .cancellation
                .unwrap_or_else(|| Arc::new(CancellationToken::new())),
        })
    }
}
