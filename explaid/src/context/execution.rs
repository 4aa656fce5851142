//! The pipeline context: initial input plus the outputs of finished stages.

use super::RunIdentity;
use crate::errors::OutputConflictError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a stage: its position in the pipeline's stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct StageId(pub usize);

impl StageId {
    /// The stage's position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
struct RecordedOutput<O> {
    label: String,
    value: O,
}

/// The context a pipeline run threads through its stages.
///
/// Holds the run's initial input and, per finished stage, its output. Each
/// stage's output is written once, by the orchestrator, after the stage's
/// indicator finished. Stages only ever see a shared reference, so prior
/// outputs are read-only to them.
#[derive(Debug)]
pub struct PipelineContext<I, O> {
    identity: RunIdentity,
    input: I,
    outputs: BTreeMap<StageId, RecordedOutput<O>>,
}

impl<I, O> PipelineContext<I, O> {
    /// Creates a context with a fresh run identity.
    #[must_use]
    pub fn new(input: I) -> Self {
        Self::with_identity(input, RunIdentity::new())
    }

    /// Creates a context with the given run identity.
    #[must_use]
    pub fn with_identity(input: I, identity: RunIdentity) -> Self {
        Self {
            identity,
            input,
            outputs: BTreeMap::new(),
        }
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the initial input.
    #[must_use]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// Records the output of a stage.
    ///
    /// # Errors
    ///
    /// Returns [`OutputConflictError`] if the stage already has an output;
    /// the recorded value is left untouched.
    pub fn record(&mut self, id: StageId, label: impl Into<String>, value: O) -> Result<(), OutputConflictError> {
        let label = label.into();
        if self.outputs.contains_key(&id) {
            return Err(OutputConflictError::new(id.index(), label));
        }
        self.outputs.insert(id, RecordedOutput { label, value });
        Ok(())
    }

    /// Returns the output of a stage, if it finished.
    #[must_use]
    pub fn output(&self, id: StageId) -> Option<&O> {
        self.outputs.get(&id).map(|o| &o.value)
    }

    /// Returns the output of the first stage with the given label.
    #[must_use]
    pub fn output_by_label(&self, label: &str) -> Option<&O> {
        self.outputs
            .values()
            .find(|o| o.label == label)
            .map(|o| &o.value)
    }

    /// Returns the output of the most recently finished stage.
    #[must_use]
    pub fn last_output(&self) -> Option<&O> {
        self.outputs.values().next_back().map(|o| &o.value)
    }

    /// Iterates outputs in stage order.
    pub fn outputs(&self) -> impl DoubleEndedIterator<Item = &O> {
        self.outputs.values().map(|o| &o.value)
    }

    /// Labels of the stages that recorded an output, in stage order.
    #[must_use]
    pub fn completed_labels(&self) -> Vec<&str> {
        self.outputs.values().map(|o| o.label.as_str()).collect()
    }

    /// Number of recorded outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no stage has recorded an output yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Consumes the context, returning the input and the outputs in stage order.
    #[must_use]
    pub fn into_parts(self) -> (I, Vec<O>) {
        let outputs = self.outputs.into_values().map(|o| o.value).collect();
        (self.input, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context() -> PipelineContext<&'static str, u32> {
        PipelineContext::new("input")
    }

    #[test]
    fn test_record_and_read() {
        let mut ctx = context();
        assert!(ctx.is_empty());
        assert_eq!(ctx.last_output(), None);

        ctx.record(StageId(0), "first", 10).unwrap();
        ctx.record(StageId(1), "second", 20).unwrap();

        assert_eq!(ctx.input(), &"input");
        assert_eq!(ctx.output(StageId(0)), Some(&10));
        assert_eq!(ctx.output_by_label("second"), Some(&20));
        assert_eq!(ctx.last_output(), Some(&20));
        assert_eq!(ctx.completed_labels(), vec!["first", "second"]);
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_record_is_write_once() {
        let mut ctx = context();
        ctx.record(StageId(0), "first", 10).unwrap();

        let err = ctx.record(StageId(0), "first", 99).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(ctx.output(StageId(0)), Some(&10));
    }

    #[test]
    fn test_outputs_follow_stage_order() {
        let mut ctx = context();
        ctx.record(StageId(2), "c", 3).unwrap();
        ctx.record(StageId(0), "a", 1).unwrap();
        ctx.record(StageId(1), "b", 2).unwrap();

        assert_eq!(ctx.outputs().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ctx.into_parts(), ("input", vec![1, 2, 3]));
    }

    #[test]
    fn test_stage_id_display() {
        assert_eq!(StageId(3).to_string(), "#3");
    }
}
