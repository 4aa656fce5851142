//! Pipeline building and execution.
//!
//! This module provides:
//! - The orchestrator running stages under progress supervision
//! - The builder assembling stages, pre-check, and presenter
//! - The outcome of a run

mod orchestrator;
mod outcome;

pub use orchestrator::{
    Pipeline, PipelineBuilder, Precheck, Presenter, SilentPresenter, PRECHECK_LABEL,
};
pub use outcome::{CompletedRun, PipelineOutcome};
