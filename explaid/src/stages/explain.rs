//! The four stages that explain an unsatisfiable program.

use super::Stage;
use crate::context::PipelineContext;
use crate::errors::StageError;
use crate::llm::{prompt_model, LanguageModel};
use crate::solver::{
    ConstraintExtractor, CoreComputer, Preprocessor, PreprocessedProgram, UnsatisfiableSubset,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Input of an explanation run: the program files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplainRequest {
    /// Input files; empty means standard input.
    pub files: Vec<PathBuf>,
}

impl ExplainRequest {
    /// Creates a request for `files`.
    pub fn new(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// What an explanation stage produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// The merged program and its assumptions, shared read-only.
    Preprocessed(Arc<PreprocessedProgram>),
    /// A minimal unsatisfiable subset of the assumptions.
    Core(UnsatisfiableSubset),
    /// Line number → integrity constraint involved in the conflict.
    Constraints(BTreeMap<usize, String>),
    /// The model's answer.
    Explanation(String),
}

impl Artifact {
    /// The preprocessed program, if this is one.
    #[must_use]
    pub fn as_preprocessed(&self) -> Option<&Arc<PreprocessedProgram>> {
        match self {
            Self::Preprocessed(p) => Some(p),
            _ => None,
        }
    }

    /// The unsatisfiable subset, if this is one.
    #[must_use]
    pub fn as_core(&self) -> Option<&UnsatisfiableSubset> {
        match self {
            Self::Core(s) => Some(s),
            _ => None,
        }
    }

    /// The constraints, if this is them.
    #[must_use]
    pub fn as_constraints(&self) -> Option<&BTreeMap<usize, String>> {
        match self {
            Self::Constraints(c) => Some(c),
            _ => None,
        }
    }

    /// The explanation, if this is one.
    #[must_use]
    pub fn as_explanation(&self) -> Option<&str> {
        match self {
            Self::Explanation(e) => Some(e),
            _ => None,
        }
    }
}

type ExplainContext = PipelineContext<ExplainRequest, Artifact>;

fn require<'a, T: ?Sized>(
    ctx: &'a ExplainContext,
    pick: impl Fn(&'a Artifact) -> Option<&'a T>,
    what: &str,
) -> Result<&'a T, StageError> {
    ctx.outputs()
        .rev()
        .find_map(pick)
        .ok_or_else(|| StageError::missing_input(format!("no {what} from an earlier stage")))
}

/// Merges the input files and extracts assumptions.
pub struct PreprocessStage {
    preprocessor: Arc<dyn Preprocessor>,
}

impl PreprocessStage {
    /// Label of the stage.
    pub const LABEL: &'static str = "Preprocessing";

    /// Creates the stage.
    pub fn new(preprocessor: Arc<dyn Preprocessor>) -> Self {
        Self { preprocessor }
    }
}

#[async_trait]
impl Stage<ExplainRequest, Artifact> for PreprocessStage {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn icon(&self) -> &str {
        "⚙"
    }

    async fn run(&self, ctx: &ExplainContext) -> Result<Artifact, StageError> {
        let program = self.preprocessor.preprocess(&ctx.input().files).await?;
        info!(assumptions = program.assumptions.len(), has_program = program.program.is_some(), "preprocessed");
        Ok(Artifact::Preprocessed(Arc::new(program)))
    }
}

/// Computes the minimal unsatisfiable subset.
pub struct CoreStage {
    computer: Arc<dyn CoreComputer>,
}

impl CoreStage {
    /// Label of the stage.
    pub const LABEL: &'static str = "Computing MUS";

    /// Creates the stage.
    pub fn new(computer: Arc<dyn CoreComputer>) -> Self {
        Self { computer }
    }
}

#[async_trait]
impl Stage<ExplainRequest, Artifact> for CoreStage {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn icon(&self) -> &str {
        "🔍"
    }

    async fn run(&self, ctx: &ExplainContext) -> Result<Artifact, StageError> {
        let program = require(ctx, Artifact::as_preprocessed, "preprocessed program")?;
        let Some(text) = program.program.as_deref() else {
            return Err(StageError::missing_input(
                "cannot compute an unsatisfiable subset without program text",
            ));
        };

        match self.computer.compute_core(text, &program.assumptions).await? {
            Some(subset) => {
                info!(size = subset.len(), "unsatisfiable subset found");
                Ok(Artifact::Core(subset))
            }
            None => Err(StageError::solver(
                "no unsatisfiable subset: the program is satisfiable under its assumptions",
            )),
        }
    }
}

/// Extracts the constraints involved in the conflict.
pub struct ConstraintStage {
    extractor: Arc<dyn ConstraintExtractor>,
}

impl ConstraintStage {
    /// Label of the stage.
    pub const LABEL: &'static str = "Extracting constraints";

    /// Creates the stage.
    pub fn new(extractor: Arc<dyn ConstraintExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Stage<ExplainRequest, Artifact> for ConstraintStage {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn icon(&self) -> &str {
        "📜"
    }

    async fn run(&self, ctx: &ExplainContext) -> Result<Artifact, StageError> {
        let subset = require(ctx, Artifact::as_core, "unsatisfiable subset")?;
        let constraints = self
            .extractor
            .extract_constraints(&ctx.input().files, subset)
            .await?;
        Ok(Artifact::Constraints(constraints))
    }
}

/// Asks the language model for an explanation.
pub struct PromptStage {
    model: Arc<dyn LanguageModel>,
}

impl PromptStage {
    /// Label of the stage.
    pub const LABEL: &'static str = "Prompting LLM";

    /// Creates the stage.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage<ExplainRequest, Artifact> for PromptStage {
    fn label(&self) -> &str {
        Self::LABEL
    }

    fn icon(&self) -> &str {
        "💬"
    }

    async fn run(&self, ctx: &ExplainContext) -> Result<Artifact, StageError> {
        let program = require(ctx, Artifact::as_preprocessed, "preprocessed program")?;
        let subset = require(ctx, Artifact::as_core, "unsatisfiable subset")?;
        let constraints = require(ctx, Artifact::as_constraints, "constraints")?;

        let answer = prompt_model(self.model.as_ref(), program, subset, constraints).await?;
        Ok(Artifact::Explanation(answer))
    }
}

macro_rules! debug_by_label {
    ($($stage:ty),*) => {
        $(impl fmt::Debug for $stage {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($stage)).field("label", &Self::LABEL).finish()
            }
        })*
    };
}

debug_by_label!(PreprocessStage, CoreStage, ConstraintStage, PromptStage);

/// The explanation stages in order.
pub fn explain_stages(
    preprocessor: Arc<dyn Preprocessor>,
    computer: Arc<dyn CoreComputer>,
    extractor: Arc<dyn ConstraintExtractor>,
    model: Arc<dyn LanguageModel>,
) -> Vec<Arc<dyn Stage<ExplainRequest, Artifact>>> {
    vec![
        Arc::new(PreprocessStage::new(preprocessor)),
        Arc::new(CoreStage::new(computer)),
        Arc::new(ConstraintStage::new(extractor)),
        Arc::new(PromptStage::new(model)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StageId;
    use crate::errors::ModelError;
    use crate::llm::{MockLanguageModel, ModelTag};
    use crate::solver::{
        Assumption, AssumptionSet, MockConstraintExtractor, MockCoreComputer, MockPreprocessor,
    };
    use pretty_assertions::assert_eq;

    fn context(files: &[&str]) -> ExplainContext {
        PipelineContext::new(ExplainRequest::new(files.iter().copied()))
    }

    fn program() -> Arc<PreprocessedProgram> {
        let assumptions: AssumptionSet = [Assumption::positive("a"), Assumption::positive("b")]
            .into_iter()
            .collect();
        Arc::new(PreprocessedProgram::new("{a}.\n{b}.\n:- a, b.\n", assumptions))
    }

    fn subset() -> UnsatisfiableSubset {
        UnsatisfiableSubset::new(vec![Assumption::positive("a"), Assumption::positive("b")])
    }

    #[tokio::test]
    async fn test_preprocess_stage_wraps_program() {
        let mut preprocessor = MockPreprocessor::new();
        preprocessor
            .expect_preprocess()
            .times(1)
            .returning(|files| {
                assert_eq!(files.len(), 2);
                Ok(PreprocessedProgram::new("{a}.", AssumptionSet::new()))
            });

        let stage = PreprocessStage::new(Arc::new(preprocessor));
        let out = stage.run(&context(&["a.lp", "b.lp"])).await.unwrap();

        assert_eq!(out.as_preprocessed().unwrap().program.as_deref(), Some("{a}."));
    }

    #[tokio::test]
    async fn test_core_stage_uses_program_and_assumptions() {
        let mut computer = MockCoreComputer::new();
        computer
            .expect_compute_core()
            .withf(|text, assumptions| text.contains(":- a, b.") && assumptions.len() == 2)
            .returning(|_, _| Ok(Some(subset())));

        let mut ctx = context(&["a.lp"]);
        ctx.record(StageId(0), PreprocessStage::LABEL, Artifact::Preprocessed(program()))
            .unwrap();

        let out = CoreStage::new(Arc::new(computer)).run(&ctx).await.unwrap();
        assert_eq!(out, Artifact::Core(subset()));
    }

    #[tokio::test]
    async fn test_core_stage_without_program_text_fails() {
        let computer = MockCoreComputer::new();
        let mut ctx = context(&[]);
        ctx.record(
            StageId(0),
            PreprocessStage::LABEL,
            Artifact::Preprocessed(Arc::new(PreprocessedProgram::empty())),
        )
        .unwrap();

        let err = CoreStage::new(Arc::new(computer)).run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn test_core_stage_without_subset_fails() {
        let mut computer = MockCoreComputer::new();
        computer.expect_compute_core().returning(|_, _| Ok(None));

        let mut ctx = context(&["a.lp"]);
        ctx.record(StageId(0), PreprocessStage::LABEL, Artifact::Preprocessed(program()))
            .unwrap();

        let err = CoreStage::new(Arc::new(computer)).run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Solver { .. }));
    }

    #[tokio::test]
    async fn test_constraint_stage_requires_core() {
        let extractor = MockConstraintExtractor::new();
        let err = ConstraintStage::new(Arc::new(extractor))
            .run(&context(&["a.lp"]))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("unsatisfiable subset"));
    }

    #[tokio::test]
    async fn test_prompt_stage_maps_model_errors() {
        let mut model = MockLanguageModel::new();
        model.expect_tag().return_const(ModelTag::Gpt4o);
        model
            .expect_prompt()
            .returning(|_, _| Err(ModelError::Status { status: 429, snippet: "slow down".into() }));

        let mut ctx = context(&["a.lp"]);
        ctx.record(StageId(0), PreprocessStage::LABEL, Artifact::Preprocessed(program()))
            .unwrap();
        ctx.record(StageId(1), CoreStage::LABEL, Artifact::Core(subset())).unwrap();
        ctx.record(
            StageId(2),
            ConstraintStage::LABEL,
            Artifact::Constraints(BTreeMap::from([(3, ":- a, b.".to_string())])),
        )
        .unwrap();

        let err = PromptStage::new(Arc::new(model)).run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Model { .. }));
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_stage_labels_in_order() {
        let stages = explain_stages(
            Arc::new(MockPreprocessor::new()),
            Arc::new(MockCoreComputer::new()),
            Arc::new(MockConstraintExtractor::new()),
            Arc::new(MockLanguageModel::new()),
        );
        let labels: Vec<&str> = stages.iter().map(|s| s.label()).collect();

        assert_eq!(
            labels,
            vec!["Preprocessing", "Computing MUS", "Extracting constraints", "Prompting LLM"]
        );
    }
}
