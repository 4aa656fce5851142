//! The explaid application: wires the collaborators into a pipeline and
//! prints the run's result.
//!
//! A host (the `explaid` binary) owns the process: it parses arguments,
//! installs logging and the runtime, and calls [`Application::run`].

use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::context::PipelineContext;
use crate::errors::{ConfigError, ExplaidError, StageError};
use crate::events::{EventSink, NoOpEventSink};
use crate::llm::LanguageModel;
use crate::pipeline::{Pipeline, PipelineOutcome, Precheck, Presenter};
use crate::solver::{
    ConstraintExtractor, CoreComputer, Preprocessor, SatisfiabilityChecker, UnsatisfiableSubset,
    STDIN_SENTINEL,
};
use crate::stages::{explain_stages, Artifact, ExplainRequest};
use crate::terminal::{render_bubble, render_code_excerpt, Terminal};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Version printed in the banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Line printed when no explanation is needed.
pub const SATISFIABLE_MESSAGE: &str = "Program is satisfiable, no explanation needed.";

/// Prefix of the model's answer on stdout.
pub const ANSWER_PREFIX: &str = "Answer:";

/// Process exit status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The run completed or the program was satisfiable.
    Success,
    /// A stage or the terminal failed.
    Failure,
    /// The configuration was unusable.
    Usage,
    /// The run was interrupted.
    Interrupted,
}

impl ExitStatus {
    /// The numeric exit code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Usage => 2,
            Self::Interrupted => 130,
        }
    }

    /// The status a run ending in `err` exits with.
    #[must_use]
    pub fn for_error(err: &ExplaidError) -> Self {
        match err {
            ExplaidError::Config(_) => Self::Usage,
            ExplaidError::Cancelled(_) => Self::Interrupted,
            _ => Self::Failure,
        }
    }
}

/// What a successful run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    /// The program has an answer set.
    Satisfiable,
    /// The program is unsatisfiable and the model explained why.
    Explained {
        /// The unsatisfiable subset.
        subset: UnsatisfiableSubset,
        /// The model's answer.
        answer: String,
    },
}

/// A tool the host can run with the positional arguments it received.
#[async_trait]
pub trait Application: Send + Sync {
    /// Name shown in the banner.
    fn name(&self) -> &str;

    /// Runs once over `files`; an empty list means standard input.
    async fn run(&self, files: &[PathBuf]) -> Result<RunSummary, ExplaidError>;
}

/// The external collaborators of an explanation run.
#[derive(Clone)]
pub struct Collaborators {
    /// Merges the input files.
    pub preprocessor: Arc<dyn Preprocessor>,
    /// Decides satisfiability before any stage runs.
    pub checker: Arc<dyn SatisfiabilityChecker>,
    /// Shrinks the assumptions to a minimal core.
    pub computer: Arc<dyn CoreComputer>,
    /// Finds the constraints involved.
    pub extractor: Arc<dyn ConstraintExtractor>,
    /// Writes the explanation.
    pub model: Arc<dyn LanguageModel>,
}

impl Collaborators {
    /// Builds the production collaborators: `clingo` for solving and the
    /// OpenAI Responses API for the explanation.
    ///
    /// A missing API key is not an error here; the prompt stage reports it
    /// if the program turns out to be unsatisfiable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the model client cannot be built.
    #[cfg(feature = "openai")]
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        use crate::errors::ModelError;
        use crate::llm::{OpenAiModel, UnavailableModel};
        use crate::solver::{AspPreprocessor, ClingoSolver, IntegrityConstraintExtractor};

        let model: Arc<dyn LanguageModel> = match OpenAiModel::from_config(config) {
            Ok(model) => Arc::new(model),
            Err(ModelError::MissingApiKey) => Arc::new(UnavailableModel::new(config.model)),
            Err(e) => return Err(ConfigError::invalid("endpoint", e.to_string())),
        };
        let solver = Arc::new(ClingoSolver::new(config.clingo_path.clone()));

        Ok(Self {
            preprocessor: Arc::new(AspPreprocessor::new()),
            checker: solver.clone(),
            computer: solver,
            extractor: Arc::new(IntegrityConstraintExtractor::new()),
            model,
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("model", &self.model.tag())
            .finish_non_exhaustive()
    }
}

/// Runs the satisfiability checker as the pipeline's pre-check.
struct CheckerPrecheck(Arc<dyn SatisfiabilityChecker>);

impl Precheck<ExplainRequest> for CheckerPrecheck {
    fn is_satisfiable(&self, input: &ExplainRequest) -> Result<bool, StageError> {
        self.0.check_satisfiable(&input.files)
    }
}

/// Prints the satisfiable notice, or the constraints, the subset bubble, and
/// the answer.
#[derive(Debug, Clone, Copy)]
pub struct ExplainPresenter {
    bubble_width: usize,
}

impl ExplainPresenter {
    /// Creates a presenter wrapping bubble text at `bubble_width`.
    #[must_use]
    pub fn new(bubble_width: usize) -> Self {
        Self { bubble_width }
    }
}

impl Presenter<ExplainRequest, Artifact> for ExplainPresenter {
    fn satisfiable(&self, terminal: &Terminal) -> io::Result<()> {
        terminal.write_line(SATISFIABLE_MESSAGE)
    }

    fn completed(
        &self,
        context: &PipelineContext<ExplainRequest, Artifact>,
        terminal: &Terminal,
    ) -> io::Result<()> {
        if let Some(constraints) = context.outputs().find_map(Artifact::as_constraints) {
            if !constraints.is_empty() {
                terminal.write_line(&render_code_excerpt(constraints))?;
            }
        }
        if let Some(subset) = context.outputs().find_map(Artifact::as_core) {
            let summary = format!("These assumptions cannot hold together: {subset}");
            terminal.write_line(&render_bubble(&summary, self.bubble_width))?;
        }
        let answer = context
            .outputs()
            .find_map(Artifact::as_explanation)
            .unwrap_or_default();
        terminal.write_line(&format!("{ANSWER_PREFIX} {answer}"))
    }
}

/// Explains why an answer set program has no answer set.
pub struct ExplainApp {
    config: AppConfig,
    terminal: Terminal,
    diagnostics: Terminal,
    collaborators: Collaborators,
    events: Arc<dyn EventSink>,
    cancellation: Arc<CancellationToken>,
}

impl ExplainApp {
    /// Creates the application.
    #[must_use]
    pub fn new(config: AppConfig, terminal: Terminal, collaborators: Collaborators) -> Self {
        Self {
            config,
            terminal,
            diagnostics: Terminal::stderr(),
            collaborators,
            events: Arc::new(NoOpEventSink),
            cancellation: Arc::new(CancellationToken::new()),
        }
    }

    /// Creates the application with the production collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is unusable.
    #[cfg(feature = "openai")]
    pub fn from_config(config: AppConfig, terminal: Terminal) -> Result<Self, ConfigError> {
        config.validate()?;
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::new(config, terminal, collaborators))
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Writes the banner and input lines to `diagnostics` instead of stderr.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Terminal) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Uses `token` to cancel runs.
    #[must_use]
    pub fn with_cancellation_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// The token that cancels runs.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        self.cancellation.clone()
    }

    fn pipeline(&self) -> Result<Pipeline<ExplainRequest, Artifact>, ConfigError> {
        let c = &self.collaborators;
        Pipeline::builder(self.terminal.clone())
            .stages(explain_stages(
                c.preprocessor.clone(),
                c.computer.clone(),
                c.extractor.clone(),
                c.model.clone(),
            ))
            .precheck(Arc::new(CheckerPrecheck(c.checker.clone())))
            .presenter(Arc::new(ExplainPresenter::new(self.config.bubble_width)))
            .event_sink(self.events.clone())
            .frame_interval(self.config.frame_interval())
            .cancellation_token(self.cancellation.clone())
            .build()
    }
}

impl std::fmt::Debug for ExplainApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplainApp")
            .field("config", &self.config)
            .field("terminal", &self.terminal)
            .field("collaborators", &self.collaborators)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Application for ExplainApp {
    fn name(&self) -> &str {
        "explaid"
    }

    async fn run(&self, files: &[PathBuf]) -> Result<RunSummary, ExplaidError> {
        self.diagnostics
            .write_line(&format!("{} version {VERSION}", self.name()))?;
        self.diagnostics.write_line(&reading_line(files))?;

        let pipeline = self.pipeline()?;
        debug!(stages = ?pipeline.stage_labels(), "pipeline assembled");

        match pipeline.run(ExplainRequest::new(files.iter().cloned())).await? {
            PipelineOutcome::Satisfiable => Ok(RunSummary::Satisfiable),
            PipelineOutcome::Completed(run) => {
                let subset = run
                    .context
                    .outputs()
                    .find_map(Artifact::as_core)
                    .cloned()
                    .ok_or_else(|| ExplaidError::Internal("no core was recorded".to_string()))?;
                let answer = run
                    .context
                    .last_output()
                    .and_then(Artifact::as_explanation)
                    .ok_or_else(|| ExplaidError::Internal("no answer was recorded".to_string()))?
                    .to_string();
                info!(subset = %subset, duration_ms = run.duration_ms, "explanation ready");
                Ok(RunSummary::Explained { subset, answer })
            }
        }
    }
}

/// The line naming the input: the first file, `...` when there are more,
/// or the stdin sentinel.
#[must_use]
pub fn reading_line(files: &[PathBuf]) -> String {
    match files {
        [] => format!("Reading from {STDIN_SENTINEL}"),
        [only] => format!("Reading from {}", only.display()),
        [first, ..] => format!("Reading from {} ...", first.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLanguageModel, ModelTag};
    use crate::solver::{
        Assumption, AssumptionSet, MockConstraintExtractor, MockCoreComputer, MockPreprocessor,
        MockSatisfiabilityChecker, PreprocessedProgram,
    };
    use crate::testing::{plain, CaptureBuffer};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn terminal() -> (Terminal, CaptureBuffer) {
        let buffer = CaptureBuffer::new();
        (Terminal::from_writer(buffer.clone(), false, None), buffer)
    }

    fn collaborators(satisfiable: bool) -> Collaborators {
        let mut checker = MockSatisfiabilityChecker::new();
        checker
            .expect_check_satisfiable()
            .returning(move |_| Ok(satisfiable));

        let mut preprocessor = MockPreprocessor::new();
        preprocessor.expect_preprocess().returning(|_| {
            let assumptions: AssumptionSet = [Assumption::positive("a")].into_iter().collect();
            Ok(PreprocessedProgram::new("{a}.\n:- a.\n", assumptions))
        });

        let mut computer = MockCoreComputer::new();
        computer
            .expect_compute_core()
            .returning(|_, set| Ok(Some(UnsatisfiableSubset::new(set.as_slice().to_vec()))));

        let mut extractor = MockConstraintExtractor::new();
        extractor
            .expect_extract_constraints()
            .returning(|_, _| Ok(BTreeMap::from([(2, ":- a.".to_string())])));

        let mut model = MockLanguageModel::new();
        model.expect_tag().return_const(ModelTag::Gpt4oMini);
        model
            .expect_prompt()
            .returning(|_, _| Ok("a is forbidden".to_string()));

        Collaborators {
            preprocessor: Arc::new(preprocessor),
            checker: Arc::new(checker),
            computer: Arc::new(computer),
            extractor: Arc::new(extractor),
            model: Arc::new(model),
        }
    }

    fn app(satisfiable: bool) -> (ExplainApp, CaptureBuffer, CaptureBuffer) {
        let (diagnostics, stderr) = terminal();
        let (terminal, buffer) = terminal();
        let config = AppConfig::new().with_frame_interval_ms(10);
        let app = ExplainApp::new(config, terminal, collaborators(satisfiable))
            .with_diagnostics(diagnostics);
        (app, buffer, stderr)
    }

    #[test]
    fn test_reading_line() {
        assert_eq!(reading_line(&[]), "Reading from -");
        assert_eq!(reading_line(&[PathBuf::from("a.lp")]), "Reading from a.lp");
        assert_eq!(
            reading_line(&[PathBuf::from("a.lp"), PathBuf::from("b.lp")]),
            "Reading from a.lp ..."
        );
    }

    #[test]
    fn test_exit_status_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        let err = ExplaidError::Cancelled("ctrl-c".to_string());
        assert_eq!(ExitStatus::for_error(&err), ExitStatus::Interrupted);
        let err: ExplaidError = StageError::solver("boom").into();
        assert_eq!(ExitStatus::for_error(&err).code(), 1);
        let err: ExplaidError = ConfigError::UnknownModel("gpt-3".to_string()).into();
        assert_eq!(ExitStatus::for_error(&err), ExitStatus::Usage);
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfiable_prints_notice_only() {
        let (app, buffer, stderr) = app(true);

        let summary = app.run(&[PathBuf::from("a.lp")]).await.unwrap();

        assert_eq!(summary, RunSummary::Satisfiable);
        assert_eq!(buffer.contents(), format!("{SATISFIABLE_MESSAGE}\n"));
        assert_eq!(
            stderr.contents(),
            format!("explaid version {VERSION}\nReading from a.lp\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsatisfiable_prints_answer_last() {
        let (app, buffer, stderr) = app(false);

        let summary = app.run(&[]).await.unwrap();

        let RunSummary::Explained { subset, answer } = summary else {
            panic!("expected an explanation");
        };
        assert_eq!(subset.predicates(), vec!["a"]);
        assert_eq!(answer, "a is forbidden");

        assert!(stderr.contents().ends_with("Reading from -\n"));
        let output = plain(&buffer.contents());
        assert!(!output.contains("explaid version"));
        assert!(output.contains("2 │ :- a."));
        assert!(output.contains("These assumptions cannot hold together: {a}"));
        assert!(output.ends_with("Answer: a is forbidden\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_run_reports_interruption() {
        let (app, _buffer, _stderr) = app(false);
        app.cancellation_token().cancel("ctrl-c");

        let err = app.run(&[]).await.unwrap_err();
        assert_eq!(ExitStatus::for_error(&err), ExitStatus::Interrupted);
    }
}
