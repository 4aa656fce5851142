//! Stage trait and implementations.
//!
//! Stages are the units of work a pipeline runs in strict sequence. Each
//! one carries the label and icon its progress box shows.

mod explain;

pub use explain::{
    explain_stages, Artifact, ConstraintStage, CoreStage, ExplainRequest, PreprocessStage,
    PromptStage,
};

use crate::context::PipelineContext;
use crate::errors::StageError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Trait for pipeline stages.
///
/// `I` is the pipeline's initial input and `O` the type every stage
/// produces. A stage sees the context read-only: the orchestrator records
/// its output after the stage's indicator has finished.
#[async_trait]
pub trait Stage<I: Send + Sync, O: Send + Sync>: Send + Sync + Debug {
    /// Returns the label shown in the progress box.
    fn label(&self) -> &str;

    /// Returns the icon shown in the progress box.
    fn icon(&self) -> &str {
        "•"
    }

    /// Runs the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The initial input and the outputs of all earlier stages
    async fn run(&self, ctx: &PipelineContext<I, O>) -> Result<O, StageError>;
}

/// A simple function-based stage.
pub struct FnStage<I, O, F> {
    label: String,
    icon: String,
    func: F,
    _types: PhantomData<fn() -> (I, O)>,
}

impl<I, O, F> FnStage<I, O, F>
where
    F: Fn(&PipelineContext<I, O>) -> Result<O, StageError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(label: impl Into<String>, icon: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            icon: icon.into(),
            func,
            _types: PhantomData,
        }
    }
}

impl<I, O, F> Debug for FnStage<I, O, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .finish()
    }
}

#[async_trait]
impl<I, O, F> Stage<I, O> for FnStage<I, O, F>
where
    I: Send + Sync,
    O: Send + Sync,
    F: Fn(&PipelineContext<I, O>) -> Result<O, StageError> + Send + Sync,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    async fn run(&self, ctx: &PipelineContext<I, O>) -> Result<O, StageError> {
        (self.func)(ctx)
    }
}
