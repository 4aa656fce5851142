//! The `clingo` executable as satisfiability checker and core computer.

use super::preprocess::STDIN_SENTINEL;
use super::program::{Assumption, AssumptionSet, UnsatisfiableSubset};
use super::{CoreComputer, SatisfiabilityChecker};
use crate::errors::StageError;
use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Default executable name.
pub const DEFAULT_CLINGO: &str = "clingo";

const EXIT_SATISFIABLE: i32 = 10;
const EXIT_UNSATISFIABLE: i32 = 20;
const EXIT_SATISFIABLE_EXHAUSTED: i32 = 30;

/// Outcome of one solver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one model exists.
    Satisfiable,
    /// No model exists.
    Unsatisfiable,
}

impl Verdict {
    /// Reads the verdict from clingo's exit code, falling back to its output.
    ///
    /// # Errors
    ///
    /// Returns a solver failure when neither says anything conclusive.
    pub fn from_run(code: Option<i32>, stdout: &str, stderr: &str) -> Result<Self, StageError> {
        match code {
            Some(EXIT_SATISFIABLE | EXIT_SATISFIABLE_EXHAUSTED) => return Ok(Self::Satisfiable),
            Some(EXIT_UNSATISFIABLE) => return Ok(Self::Unsatisfiable),
            _ => {}
        }

        for line in stdout.lines().map(str::trim) {
            match line {
                "UNSATISFIABLE" => return Ok(Self::Unsatisfiable),
                "SATISFIABLE" | "OPTIMUM FOUND" => return Ok(Self::Satisfiable),
                _ => {}
            }
        }

        let detail = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("no output");
        Err(StageError::solver(format!(
            "clingo gave no verdict (exit code {}): {detail}",
            code.map_or_else(|| "none".to_string(), |c| c.to_string())
        )))
    }

    /// Whether this is [`Verdict::Satisfiable`].
    #[must_use]
    pub fn is_satisfiable(self) -> bool {
        self == Self::Satisfiable
    }
}

/// Runs the `clingo` binary.
#[derive(Debug, Clone)]
pub struct ClingoSolver {
    binary: PathBuf,
}

impl ClingoSolver {
    /// Uses the executable at `binary` (looked up on `PATH` if relative).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The executable in use.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Solves `program` fed through stdin.
    pub async fn solve(&self, program: &str) -> Result<Verdict, StageError> {
        let mut child = tokio::process::Command::new(&self.binary)
            .args([STDIN_SENTINEL, "--models=1", "--verbose=0"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        let Some(mut stdin) = child.stdin.take() else {
            return Err(StageError::solver("clingo stdin unavailable"));
        };
        stdin.write_all(program.as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        Verdict::from_run(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }

    fn spawn_error(&self, e: &std::io::Error) -> StageError {
        StageError::solver(format!("failed to run `{}`: {e}", self.binary.display()))
    }
}

impl Default for ClingoSolver {
    fn default() -> Self {
        Self::new(DEFAULT_CLINGO)
    }
}

impl ClingoSolver {
    fn run_check(
        &self,
        files: &[PathBuf],
        stdin: impl FnOnce() -> Stdio,
    ) -> Result<bool, StageError> {
        let mut command = Command::new(&self.binary);
        command.args(["--models=1", "--verbose=0"]);
        if files.is_empty() {
            command.arg(STDIN_SENTINEL);
        } else {
            command.args(files);
        }
        command.stdin(if reads_stdin(files) { stdin() } else { Stdio::null() });

        let output = command.output().map_err(|e| self.spawn_error(&e))?;
        let verdict = Verdict::from_run(
            output.status.code(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )?;

        info!(files = files.len(), ?verdict, "satisfiability checked");
        Ok(verdict.is_satisfiable())
    }
}

impl SatisfiabilityChecker for ClingoSolver {
    fn check_satisfiable(&self, files: &[PathBuf]) -> Result<bool, StageError> {
        self.run_check(files, Stdio::inherit)
    }
}

/// Whether solving `files` consumes standard input.
#[must_use]
pub fn reads_stdin(files: &[PathBuf]) -> bool {
    files.is_empty() || files.iter().any(|f| f.as_os_str() == STDIN_SENTINEL)
}

#[async_trait]
impl CoreComputer for ClingoSolver {
    async fn compute_core(
        &self,
        program: &str,
        assumptions: &AssumptionSet,
    ) -> Result<Option<UnsatisfiableSubset>, StageError> {
        shrink_core(assumptions.as_slice(), |kept| {
            let text = with_assumptions(program, &kept);
            async move { Ok(!self.solve(&text).await?.is_satisfiable()) }
        })
        .await
    }
}

/// The program with every kept assumption enforced.
#[must_use]
pub fn with_assumptions(program: &str, kept: &[Assumption]) -> String {
    let mut text = String::with_capacity(program.len() + kept.len() * 16);
    text.push_str(program);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    for assumption in kept {
        text.push_str(&assumption.as_rule());
        text.push('\n');
    }
    text
}

/// Deletion-based shrinking of an unsatisfiable assumption set.
///
/// `is_unsat` reports whether the program is unsatisfiable when exactly the
/// given assumptions are enforced. Returns `None` if the full set is
/// satisfiable. Otherwise each assumption is dropped in turn and stays
/// dropped when the rest remains unsatisfiable; what is left is minimal.
pub async fn shrink_core<F, Fut>(
    assumptions: &[Assumption],
    mut is_unsat: F,
) -> Result<Option<UnsatisfiableSubset>, StageError>
where
    F: FnMut(Vec<Assumption>) -> Fut,
    Fut: Future<Output = Result<bool, StageError>>,
{
    if !is_unsat(assumptions.to_vec()).await? {
        return Ok(None);
    }

    let mut core = assumptions.to_vec();
    let mut i = 0;
    while i < core.len() {
        let mut candidate = core.clone();
        candidate.remove(i);
        if is_unsat(candidate.clone()).await? {
            core = candidate;
        } else {
            i += 1;
        }
    }

    debug!(from = assumptions.len(), to = core.len(), "core shrunk");
    Ok(Some(UnsatisfiableSubset::new(core)))
}
