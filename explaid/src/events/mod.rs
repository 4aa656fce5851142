//! Pipeline events and the sinks that receive them.
//!
//! There is no process-wide sink: the orchestrator receives an
//! `Arc<dyn EventSink>` explicitly and passes it down to each indicator.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::Serialize;

/// Something that happened during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The synchronous satisfiability pre-check returned.
    PrecheckCompleted {
        /// Whether the input was satisfiable.
        satisfiable: bool,
    },
    /// The staged part of the run began.
    PipelineStarted {
        /// The run identifier.
        run_id: String,
        /// Number of stages to run.
        stage_count: usize,
    },
    /// A stage's work is about to start.
    StageStarted {
        /// Position of the stage.
        index: usize,
        /// The stage label.
        label: String,
    },
    /// A stage returned successfully and its indicator finished.
    StageCompleted {
        /// Position of the stage.
        index: usize,
        /// The stage label.
        label: String,
        /// Wall-clock duration of the stage.
        duration_ms: f64,
    },
    /// A stage failed; no further stages run.
    StageFailed {
        /// Position of the stage.
        index: usize,
        /// The stage label.
        label: String,
        /// Rendered error message.
        error: String,
    },
    /// An indicator drew its first frame.
    IndicatorRunning {
        /// The stage label.
        label: String,
    },
    /// An indicator drew its finished box and terminated.
    IndicatorFinished {
        /// The stage label.
        label: String,
        /// Number of spinner frames drawn before finishing.
        frames_drawn: usize,
    },
    /// All stages completed and the result was displayed.
    PipelineCompleted {
        /// The run identifier.
        run_id: String,
        /// Wall-clock duration of the staged run.
        duration_ms: f64,
    },
    /// The run was cancelled from outside.
    PipelineCancelled {
        /// The cancellation reason.
        reason: String,
    },
}

impl PipelineEvent {
    /// Dotted event type name, e.g. `stage.started`.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PrecheckCompleted { .. } => "pipeline.precheck",
            Self::PipelineStarted { .. } => "pipeline.started",
            Self::StageStarted { .. } => "stage.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::IndicatorRunning { .. } => "indicator.running",
            Self::IndicatorFinished { .. } => "indicator.finished",
            Self::PipelineCompleted { .. } => "pipeline.completed",
            Self::PipelineCancelled { .. } => "pipeline.cancelled",
        }
    }

    /// JSON payload of the event.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = PipelineEvent::StageStarted {
            index: 2,
            label: "Extracting constraints".into(),
        };
        let json = event.to_json();

        assert_eq!(json["type"], "stage_started");
        assert_eq!(json["index"], 2);
        assert_eq!(event.event_type(), "stage.started");
    }
}
