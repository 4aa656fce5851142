//! Fixed-answer collaborators for running the explanation pipeline
//! without `clingo` or network access.

use crate::errors::{ModelError, StageError};
use crate::llm::{LanguageModel, ModelTag};
use crate::solver::{AssumptionSet, CoreComputer, SatisfiabilityChecker, UnsatisfiableSubset};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

/// A pre-check returning a fixed verdict and recording its inputs.
#[derive(Debug, Default)]
pub struct FixedVerdict {
    satisfiable: bool,
    seen: Mutex<Vec<Vec<PathBuf>>>,
}

impl FixedVerdict {
    /// Always reports `satisfiable`.
    #[must_use]
    pub fn new(satisfiable: bool) -> Self {
        Self {
            satisfiable,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// File lists the checker was called with.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.seen.lock().clone()
    }
}

impl SatisfiabilityChecker for FixedVerdict {
    fn check_satisfiable(&self, files: &[PathBuf]) -> Result<bool, StageError> {
        self.seen.lock().push(files.to_vec());
        Ok(self.satisfiable)
    }
}

/// A core computer treating the whole assumption set as the core.
#[derive(Debug, Default)]
pub struct WholeSetCore {
    delay: Option<Duration>,
}

impl WholeSetCore {
    /// Creates the computer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl CoreComputer for WholeSetCore {
    async fn compute_core(
        &self,
        _program: &str,
        assumptions: &AssumptionSet,
    ) -> Result<Option<UnsatisfiableSubset>, StageError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Some(UnsatisfiableSubset::new(assumptions.as_slice().to_vec())))
    }
}

/// A language model with a canned answer.
#[derive(Debug)]
pub struct CannedModel {
    answer: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    /// Always answers `answer`.
    #[must_use]
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            answer: Ok(answer.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a transport error carrying `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Inputs the model was prompted with.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for CannedModel {
    fn tag(&self) -> ModelTag {
        ModelTag::default()
    }

    async fn prompt(&self, _instructions: &str, input: &str) -> Result<String, ModelError> {
        self.prompts.lock().push(input.to_string());
        self.answer.clone().map_err(ModelError::Transport)
    }
}
