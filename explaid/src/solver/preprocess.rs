//! Turning input files into one program plus its assumptions.

use super::program::{Assumption, AssumptionSet, PreprocessedProgram};
use super::Preprocessor;
use crate::errors::StageError;
use async_trait::async_trait;
use futures::future::try_join_all;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Path that stands for standard input.
pub const STDIN_SENTINEL: &str = "-";

/// A whole-line ground fact: `name.` or `name(args).`
static FACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([a-z][A-Za-z0-9_']*(?:\([^:]*\))?)\s*\.\s*$").expect("fact pattern is valid")
});

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("string pattern is valid"));

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^A-Za-z0-9_'])[A-Z_]").expect("variable pattern is valid"));

/// Preprocessor for ASP programs.
///
/// Concatenates the input files and rewrites every ground fact `a.` into the
/// choice `{a}.`, recording `(a, true)` as an assumption. The core stage can
/// then switch each fact on or off through the assumption set.
#[derive(Debug, Clone, Default)]
pub struct AspPreprocessor;

impl AspPreprocessor {
    /// Creates a preprocessor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rewrites program text, collecting assumptions into `assumptions`.
    #[must_use]
    pub fn rewrite(&self, text: &str, assumptions: &mut AssumptionSet) -> String {
        let mut out = String::with_capacity(text.len());
        for line in text.lines() {
            let (code, comment) = split_comment(line);
            match ground_fact(code) {
                Some(atom) => {
                    assumptions.insert(Assumption::positive(atom));
                    out.push_str(&format!("{{{atom}}}.{comment}"));
                }
                None => out.push_str(line),
            }
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl Preprocessor for AspPreprocessor {
    async fn preprocess(&self, files: &[PathBuf]) -> Result<PreprocessedProgram, StageError> {
        if files.is_empty() {
            return Ok(PreprocessedProgram::empty());
        }

        let texts = try_join_all(files.iter().map(|path| read_input(path))).await?;

        let mut assumptions = AssumptionSet::new();
        let mut program = String::new();
        for text in &texts {
            program.push_str(&self.rewrite(text, &mut assumptions));
        }

        debug!(files = files.len(), assumptions = assumptions.len(), "preprocessed program");
        Ok(PreprocessedProgram::new(program, assumptions))
    }
}

/// Reads a file, or standard input for [`STDIN_SENTINEL`].
pub async fn read_input(path: &Path) -> Result<String, StageError> {
    if path.as_os_str() == STDIN_SENTINEL {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| StageError::io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))))
}

fn split_comment(line: &str) -> (&str, &str) {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '%' if !in_string => return (&line[..i], &line[i..]),
            _ => {}
        }
    }
    (line, "")
}

fn ground_fact(code: &str) -> Option<&str> {
    let atom = FACT.captures(code)?.get(1)?.as_str();
    let without_strings = STRING_LITERAL.replace_all(atom, "\"\"");
    if VARIABLE.is_match(&without_strings) || atom.contains("..") || atom.contains(';') {
        return None;
    }
    Some(atom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_rewrite_turns_facts_into_choices() {
        let mut assumptions = AssumptionSet::new();
        let text = "a.\nb(1, \"X\").\nc(X) :- b(X, _).\n:- a, c(1).\n";

        let rewritten = AspPreprocessor::new().rewrite(text, &mut assumptions);

        assert_eq!(
            rewritten,
            "{a}.\n{b(1, \"X\")}.\nc(X) :- b(X, _).\n:- a, c(1).\n"
        );
        assert_eq!(
            assumptions.as_slice(),
            &[Assumption::positive("a"), Assumption::positive("b(1, \"X\")")]
        );
    }

    #[test]
    fn test_non_ground_and_ranges_are_kept() {
        let mut assumptions = AssumptionSet::new();
        let text = "p(X).\nn(1..3).\nq(a;b).\n";

        let rewritten = AspPreprocessor::new().rewrite(text, &mut assumptions);

        assert_eq!(rewritten, text);
        assert!(assumptions.is_empty());
    }

    #[test]
    fn test_comments_are_preserved() {
        let mut assumptions = AssumptionSet::new();
        let rewritten = AspPreprocessor::new().rewrite("a. % the fact\n", &mut assumptions);

        assert_eq!(rewritten, "{a}.% the fact\n");
        assert_eq!(assumptions.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_files_yield_no_program() {
        let result = AspPreprocessor::new().preprocess(&[]).await.unwrap();
        assert_eq!(result, PreprocessedProgram::empty());
    }

    #[tokio::test]
    async fn test_files_are_concatenated() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "a.").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, ":- a.").unwrap();

        let files = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let result = AspPreprocessor::new().preprocess(&files).await.unwrap();

        assert_eq!(result.program.as_deref(), Some("{a}.\n:- a.\n"));
        assert_eq!(result.assumptions.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_failure() {
        let files = vec![PathBuf::from("/definitely/not/here.lp")];
        let err = AspPreprocessor::new().preprocess(&files).await.unwrap_err();

        assert!(matches!(err, StageError::Io { .. }));
        assert!(err.to_string().contains("here.lp"));
    }
}
