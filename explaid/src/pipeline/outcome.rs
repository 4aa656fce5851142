//! What a pipeline run returns.

use crate::context::PipelineContext;
use crate::progress::IndicatorReport;

/// Result of a successful pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome<I, O> {
    /// The pre-check found the input satisfiable; no stage ran.
    Satisfiable,
    /// Every stage ran.
    Completed(CompletedRun<I, O>),
}

impl<I, O> PipelineOutcome<I, O> {
    /// Whether the run stopped at the pre-check.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, Self::Satisfiable)
    }

    /// The completed run, if stages ran.
    #[must_use]
    pub fn completed(&self) -> Option<&CompletedRun<I, O>> {
        match self {
            Self::Completed(run) => Some(run),
            Self::Satisfiable => None,
        }
    }

    /// The final stage's output, if stages ran.
    #[must_use]
    pub fn final_output(&self) -> Option<&O> {
        self.completed().and_then(|run| run.context.last_output())
    }
}

/// A run in which every stage completed.
#[derive(Debug)]
pub struct CompletedRun<I, O> {
    /// The context holding every stage output.
    pub context: PipelineContext<I, O>,
    /// One report per stage indicator, in stage order.
    pub reports: Vec<IndicatorReport>,
    /// Wall-clock duration of the staged part in milliseconds.
    pub duration_ms: f64,
}
