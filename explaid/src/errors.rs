//! Error types for the explaid pipeline.
//!
//! The taxonomy follows the three failure categories of a pipeline run:
//! stage failures reported by an external collaborator, rendering
//! preconditions the terminal does not meet, and cancellation. A
//! cancellation signal delivered to an indicator that already finished is
//! not an error at all and therefore has no variant here.

use std::time::Duration;
use thiserror::Error;

/// Unified result alias for the crate.
pub type Result<T, E = ExplaidError> = std::result::Result<T, E>;

/// The main error type for explaid operations.
#[derive(Debug, Error)]
pub enum ExplaidError {
    /// A stage's collaborator reported a failure.
    #[error("{0}")]
    Stage(#[from] StageError),

    /// The terminal cannot host the progress boxes.
    #[error("{0}")]
    Rendering(#[from] RenderingError),

    /// Configuration was missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A stage output was recorded twice.
    #[error("{0}")]
    OutputConflict(#[from] OutputConflictError),

    /// The run was cancelled from the outside (e.g. Ctrl-C).
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),

    /// A background task could not be joined.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExplaidError {
    /// Returns the label of the stage that failed, if the error came from one.
    #[must_use]
    pub fn stage_label(&self) -> Option<&str> {
        match self {
            Self::Stage(err) => err.stage(),
            _ => None,
        }
    }
}

/// A failure reported while a stage was running.
#[derive(Debug, Error)]
pub enum StageError {
    /// The solving collaborator failed.
    #[error("Solver failure{}: {message}", stage_suffix(.stage))]
    Solver {
        /// Label of the failing stage.
        stage: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// Constraint extraction failed.
    #[error("Extraction failure{}: {message}", stage_suffix(.stage))]
    Extraction {
        /// Label of the failing stage.
        stage: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// The language model call failed.
    #[error("Model failure{}: {source}", stage_suffix(.stage))]
    Model {
        /// Label of the failing stage.
        stage: Option<String>,
        /// The client error.
        #[source]
        source: ModelError,
    },

    /// A stage expected an earlier output that is not in the context.
    #[error("Missing input{}: {message}", stage_suffix(.stage))]
    MissingInput {
        /// Label of the failing stage.
        stage: Option<String>,
        /// What was missing.
        message: String,
    },

    /// Reading input files failed.
    #[error("IO failure{}: {source}", stage_suffix(.stage))]
    Io {
        /// Label of the failing stage.
        stage: Option<String>,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

fn stage_suffix(stage: &Option<String>) -> String {
    stage
        .as_deref()
        .map(|s| format!(" in stage '{s}'"))
        .unwrap_or_default()
}

impl StageError {
    /// Creates a solver failure.
    #[must_use]
    pub fn solver(message: impl Into<String>) -> Self {
        Self::Solver {
            stage: None,
            message: message.into(),
        }
    }

    /// Creates an extraction failure.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            stage: None,
            message: message.into(),
        }
    }

    /// Creates a missing input failure.
    #[must_use]
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            stage: None,
            message: message.into(),
        }
    }

    /// Wraps an IO error.
    #[must_use]
    pub fn io(source: std::io::Error) -> Self {
        Self::Io {
            stage: None,
            source,
        }
    }

    /// Attaches the failing stage's label unless one is already set.
    #[must_use]
    pub fn in_stage(mut self, label: &str) -> Self {
        let slot = match &mut self {
            Self::Solver { stage, .. }
            | Self::Extraction { stage, .. }
            | Self::Model { stage, .. }
            | Self::MissingInput { stage, .. }
            | Self::Io { stage, .. } => stage,
        };
        if slot.is_none() {
            *slot = Some(label.to_string());
        }
        self
    }

    /// Returns the label of the failing stage, if known.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Solver { stage, .. }
            | Self::Extraction { stage, .. }
            | Self::Model { stage, .. }
            | Self::MissingInput { stage, .. }
            | Self::Io { stage, .. } => stage.as_deref(),
        }
    }
}

impl From<ModelError> for StageError {
    fn from(source: ModelError) -> Self {
        Self::Model {
            stage: None,
            source,
        }
    }
}

impl From<std::io::Error> for StageError {
    fn from(source: std::io::Error) -> Self {
        Self::io(source)
    }
}

/// Unmet assumptions about the terminal.
#[derive(Debug, Error)]
pub enum RenderingError {
    /// The progress box does not fit into the terminal.
    #[error("Progress box for '{label}' needs {required} columns but the terminal has {available}")]
    TooNarrow {
        /// The stage label.
        label: String,
        /// Columns the box needs.
        required: usize,
        /// Columns the terminal offers.
        available: usize,
    },

    /// Writing to the output stream failed mid-render.
    #[error("Failed to draw progress box: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors raised by the language model client.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No API key was configured.
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,

    /// The endpoint is not an http(s) URL.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {snippet}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Start of the response body.
        snippet: String,
    },

    /// The response could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The response contained no text.
    #[error("the model returned an empty answer")]
    EmptyAnswer,
}

#[cfg(feature = "openai")]
impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Configuration problems detected at startup.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// An environment variable held an unusable value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// The variable or field name.
        key: String,
        /// Why it was rejected.
        message: String,
    },

    /// The requested model tag is unknown.
    #[error("unknown model '{0}' (expected one of: gpt-4o, gpt-4o-mini)")]
    UnknownModel(String),
}

impl ConfigError {
    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a stage output is recorded a second time.
#[derive(Debug, Clone, Error)]
#[error("Output conflict for stage #{index} '{label}': output already recorded")]
pub struct OutputConflictError {
    /// Position of the stage in the pipeline.
    pub index: usize,
    /// The stage label.
    pub label: String,
}

impl OutputConflictError {
    /// Creates a new output conflict error.
    #[must_use]
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_in_stage_sets_label_once() {
        let err = StageError::solver("clingo crashed")
            .in_stage("Computing MUS")
            .in_stage("Other");

        assert_eq!(err.stage(), Some("Computing MUS"));
        assert_eq!(
            err.to_string(),
            "Solver failure in stage 'Computing MUS': clingo crashed"
        );
    }

    #[test]
    fn test_stage_error_without_label() {
        let err = StageError::extraction("no constraints");
        assert_eq!(err.to_string(), "Extraction failure: no constraints");
    }

    #[test]
    fn test_model_error_converts_into_stage_error() {
        let err: StageError = ModelError::MissingApiKey.into();
        assert!(matches!(err, StageError::Model { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_explaid_error_stage_label() {
        let err: ExplaidError = StageError::solver("boom").in_stage("Preprocessing").into();
        assert_eq!(err.stage_label(), Some("Preprocessing"));

        let err = ExplaidError::Cancelled("ctrl-c".into());
        assert_eq!(err.stage_label(), None);
    }

    #[test]
    fn test_rendering_error_message() {
        let err = RenderingError::TooNarrow {
            label: "Preprocessing".into(),
            required: 40,
            available: 20,
        };
        assert!(err.to_string().contains("40 columns"));
    }
}
