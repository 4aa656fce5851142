//! Language model access for the explanation stage.

#[cfg(feature = "openai")]
mod openai;
mod tags;
mod template;

#[cfg(feature = "openai")]
pub use openai::{make_snippet, OpenAiModel};
pub use tags::ModelTag;
pub use template::ExplainTemplate;

use crate::errors::ModelError;
use crate::solver::{PreprocessedProgram, UnsatisfiableSubset};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// A model that answers a prompt made of instructions and input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// The model in use.
    fn tag(&self) -> ModelTag;

    /// Sends one prompt and returns the answer text.
    async fn prompt(&self, instructions: &str, input: &str) -> Result<String, ModelError>;
}

/// Stands in for a model that has no API key; every prompt fails with
/// [`ModelError::MissingApiKey`].
///
/// Lets a satisfiable program be checked without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableModel {
    tag: ModelTag,
}

impl UnavailableModel {
    /// Creates the stand-in for `tag`.
    #[must_use]
    pub fn new(tag: ModelTag) -> Self {
        Self { tag }
    }
}

#[async_trait]
impl LanguageModel for UnavailableModel {
    fn tag(&self) -> ModelTag {
        self.tag
    }

    async fn prompt(&self, _instructions: &str, _input: &str) -> Result<String, ModelError> {
        Err(ModelError::MissingApiKey)
    }
}

/// Asks `model` to explain why `subset` is unsatisfiable.
///
/// # Errors
/// Whatever the model client reports.
pub async fn prompt_model(
    model: &dyn LanguageModel,
    program: &PreprocessedProgram,
    subset: &UnsatisfiableSubset,
    constraints: &BTreeMap<usize, String>,
) -> Result<String, ModelError> {
    let template = ExplainTemplate::new(program, subset, constraints);
    let input = template.compose_input();
    debug!(model = %model.tag(), input_len = input.len(), "prompting model");
    model.prompt(&template.compose_instructions(), &input).await
}
