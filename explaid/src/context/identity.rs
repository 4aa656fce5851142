//! Run identity for tracking pipeline executions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// The unique ID for this pipeline run.
    pub pipeline_run_id: Uuid,

    /// Number of input files the run was started with.
    #[serde(default)]
    pub input_count: usize,
}

impl RunIdentity {
    /// Creates a new run identity with a generated pipeline run ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pipeline_run_id(Uuid::new_v4())
    }

    /// Creates a run identity with a specific pipeline run ID.
    #[must_use]
    pub fn with_pipeline_run_id(pipeline_run_id: Uuid) -> Self {
        Self {
            pipeline_run_id,
            input_count: 0,
        }
    }

    /// Sets the number of input files.
    #[must_use]
    pub fn with_input_count(mut self, input_count: usize) -> Self {
        self.input_count = input_count;
        self
    }

    /// The first eight hex digits of the run ID, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        self.pipeline_run_id.simple().to_string()[..8].to_string()
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pipeline_run_id)
    }
}
