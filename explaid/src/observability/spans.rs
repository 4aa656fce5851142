//! Span attributes and timing for pipeline runs and stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Span attributes for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSpanAttributes {
    /// Pipeline run ID.
    pub run_id: Option<String>,
    /// Number of stages.
    pub stage_count: usize,
    /// Whether progress boxes are animated.
    pub interactive: bool,
    /// Outcome, once known.
    pub outcome: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
}

impl RunSpanAttributes {
    /// Creates new run span attributes.
    #[must_use]
    pub fn new(stage_count: usize, interactive: bool) -> Self {
        Self {
            stage_count,
            interactive,
            ..Default::default()
        }
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Flattens to dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        attrs.insert("pipeline.stage_count".to_string(), self.stage_count.to_string());
        attrs.insert("pipeline.interactive".to_string(), self.interactive.to_string());
        if let Some(ref v) = self.outcome {
            attrs.insert("pipeline.outcome".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("pipeline.duration_ms".to_string(), v.to_string());
        }

        attrs
    }
}

/// Span attributes for stage execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSpanAttributes {
    /// Stage label.
    pub label: String,
    /// Position in the pipeline.
    pub index: usize,
    /// Stage status.
    pub status: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Spinner frames drawn while the stage ran.
    pub frames_drawn: Option<usize>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl StageSpanAttributes {
    /// Creates new stage span attributes.
    #[must_use]
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            index,
            ..Default::default()
        }
    }

    /// Sets the stage status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the number of frames drawn.
    #[must_use]
    pub fn with_frames_drawn(mut self, frames: usize) -> Self {
        self.frames_drawn = Some(frames);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Flattens to dotted attribute names.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("stage.label".to_string(), self.label.clone());
        attrs.insert("stage.index".to_string(), self.index.to_string());
        if let Some(ref v) = self.status {
            attrs.insert("stage.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("stage.duration_ms".to_string(), v.to_string());
        }
        if let Some(v) = self.frames_drawn {
            attrs.insert("stage.frames_drawn".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error {
            attrs.insert("stage.error".to_string(), v.clone());
        }

        attrs
    }

    /// Logs the attributes as one tracing event.
    pub fn record(&self) {
        match self.error {
            Some(ref error) => tracing::warn!(
                stage = %self.label,
                index = self.index,
                duration_ms = self.duration_ms,
                %error,
                "stage failed"
            ),
            None => tracing::info!(
                stage = %self.label,
                index = self.index,
                duration_ms = self.duration_ms,
                frames = self.frames_drawn,
                "stage finished"
            ),
        }
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}
