//! Stages with scripted behavior.

use crate::context::PipelineContext;
use crate::errors::StageError;
use crate::stages::Stage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type StageFn<I, O> = dyn Fn(&PipelineContext<I, O>) -> Result<O, StageError> + Send + Sync;

/// A stage that optionally sleeps, then returns what its closure returns.
///
/// Counts its calls so tests can assert that later stages never ran.
pub struct ScriptedStage<I, O> {
    label: String,
    icon: String,
    delay: Option<Duration>,
    func: Box<StageFn<I, O>>,
    calls: AtomicUsize,
}

impl<I, O> ScriptedStage<I, O> {
    /// Creates a stage running `func`.
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&PipelineContext<I, O>) -> Result<O, StageError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            icon: "•".to_string(),
            delay: None,
            func: Box::new(func),
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleeps for `delay` before producing the result.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Number of times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<I, O> std::fmt::Debug for ScriptedStage<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedStage")
            .field("label", &self.label)
            .field("delay", &self.delay)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl<I: Send + Sync, O: Send + Sync> Stage<I, O> for ScriptedStage<I, O> {
    fn label(&self) -> &str {
        &self.label
    }

    fn icon(&self) -> &str {
        &self.icon
    }

    async fn run(&self, ctx: &PipelineContext<I, O>) -> Result<O, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.func)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scripted_stage_counts_calls() {
        let stage = ScriptedStage::new("echo", |ctx: &PipelineContext<u8, u8>| Ok(*ctx.input()))
            .with_delay(Duration::from_millis(100))
            .with_icon("E");
        let ctx = PipelineContext::new(7);

        assert_eq!(stage.run(&ctx).await.unwrap(), 7);
        assert_eq!(stage.call_count(), 1);
        assert_eq!(stage.icon(), "E");
    }
}
