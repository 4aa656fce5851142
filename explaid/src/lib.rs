//! # explaid
//!
//! Explains why an answer set program has no answer set.
//!
//! explaid runs a fixed pipeline over one or more logic program files:
//!
//! - **Satisfiability pre-check**: a satisfiable program needs no explanation
//! - **Preprocessing**: merges the files and turns facts into assumptions
//! - **Core computation**: shrinks the assumptions to a minimal unsatisfiable subset
//! - **Constraint extraction**: finds the integrity constraints involved
//! - **Prompting**: asks a language model to explain the conflict
//!
//! Every stage runs under a progress box whose spinner animates while the
//! stage works and turns into a finished marker once it is done.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use explaid::prelude::*;
//!
//! let config = AppConfig::from_env()?;
//! let app = ExplainApp::from_config(config, Terminal::stdout())?;
//! let summary = app.run(&["encoding.lp".into(), "instance.lp".into()]).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod app;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod progress;
pub mod solver;
pub mod stages;
pub mod terminal;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::{Application, Collaborators, ExitStatus, ExplainApp, RunSummary};
    pub use crate::cancellation::{CancellationToken, SupervisedTask};
    pub use crate::config::AppConfig;
    pub use crate::context::{PipelineContext, RunIdentity, StageId};
    pub use crate::errors::{
        ConfigError, ExplaidError, ModelError, OutputConflictError, RenderingError, StageError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
    pub use crate::llm::{LanguageModel, ModelTag};
    pub use crate::pipeline::{Pipeline, PipelineBuilder, PipelineOutcome, Precheck, Presenter};
    pub use crate::progress::{ProgressHandle, ProgressIndicator, SpinnerSequence};
    pub use crate::solver::{
        ConstraintExtractor, CoreComputer, Preprocessor, SatisfiabilityChecker,
        UnsatisfiableSubset,
    };
    pub use crate::stages::{Artifact, ExplainRequest, Stage};
    pub use crate::terminal::{CursorGuard, Terminal};
}
