//! Context threaded through a pipeline run.
//!
//! This module provides:
//! - The run identity used to correlate events and logs
//! - The pipeline context: initial input plus write-once stage outputs

mod execution;
mod identity;

pub use execution::{PipelineContext, StageId};
pub use identity::RunIdentity;
