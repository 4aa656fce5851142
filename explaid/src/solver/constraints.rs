//! Finding the integrity constraints involved in an unsatisfiable subset.

use super::preprocess::read_input;
use super::program::UnsatisfiableSubset;
use super::ConstraintExtractor;
use crate::errors::StageError;
use async_trait::async_trait;
use futures::future::try_join_all;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Extracts integrity constraints (`:- body.`) from the input files.
///
/// Keys are 1-based line numbers counted across the concatenated files, so
/// they match the line numbers of the merged program. A constraint spanning
/// several lines is keyed by its first line and joined with single spaces.
#[derive(Debug, Clone, Default)]
pub struct IntegrityConstraintExtractor;

impl IntegrityConstraintExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// All integrity constraints in `text`, numbered from `first_line`.
    #[must_use]
    pub fn scan(&self, text: &str, first_line: usize) -> BTreeMap<usize, String> {
        let mut found = BTreeMap::new();
        let mut open: Option<(usize, Vec<String>)> = None;

        for (offset, line) in text.lines().enumerate() {
            let code = strip_comment(line).trim();
            if code.is_empty() {
                continue;
            }

            let (start, mut parts) = match open.take() {
                Some(pending) => pending,
                None if code.starts_with(":-") => (first_line + offset, Vec::new()),
                None => continue,
            };
            parts.push(code.to_string());

            if code.ends_with('.') {
                found.insert(start, parts.join(" "));
            } else {
                open = Some((start, parts));
            }
        }
        found
    }

    /// Keeps the constraints mentioning a predicate of `subset`.
    ///
    /// When none does, all constraints are kept: the conflict then stems from
    /// rules the subset's atoms feed into.
    #[must_use]
    pub fn select(
        &self,
        constraints: BTreeMap<usize, String>,
        subset: &UnsatisfiableSubset,
    ) -> BTreeMap<usize, String> {
        let patterns: Vec<Regex> = subset
            .predicates()
            .into_iter()
            .filter_map(|name| {
                let escaped = regex::escape(name);
                Regex::new(&format!(r"(?:^|[^A-Za-z0-9_']){escaped}(?:[^A-Za-z0-9_']|$)")).ok()
            })
            .collect();

        let mentioning: BTreeMap<usize, String> = constraints
            .iter()
            .filter(|(_, text)| patterns.iter().any(|p| p.is_match(text)))
            .map(|(line, text)| (*line, text.clone()))
            .collect();

        if mentioning.is_empty() {
            constraints
        } else {
            mentioning
        }
    }
}

#[async_trait]
impl ConstraintExtractor for IntegrityConstraintExtractor {
    async fn extract_constraints(
        &self,
        files: &[PathBuf],
        subset: &UnsatisfiableSubset,
    ) -> Result<BTreeMap<usize, String>, StageError> {
        let texts = try_join_all(files.iter().map(|path| read_input(path))).await?;

        let mut all = BTreeMap::new();
        let mut next_line = 1;
        for text in &texts {
            all.extend(self.scan(text, next_line));
            next_line += text.lines().count();
        }

        let selected = self.select(all, subset);
        debug!(constraints = selected.len(), "constraints extracted");
        Ok(selected)
    }
}

fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '%' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Assumption;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const PROGRAM: &str = "\
a. b. c.
:- a, b.   % clash
x :- c.
:- c,
   not x.
";

    #[test]
    fn test_scan_finds_single_and_multi_line_constraints() {
        let found = IntegrityConstraintExtractor::new().scan(PROGRAM, 1);

        assert_eq!(
            found,
            BTreeMap::from([
                (2, ":- a, b.".to_string()),
                (4, ":- c, not x.".to_string()),
            ])
        );
    }

    #[test]
    fn test_select_keeps_mentioning_constraints() {
        let extractor = IntegrityConstraintExtractor::new();
        let subset = UnsatisfiableSubset::new(vec![Assumption::positive("a")]);

        let selected = extractor.select(extractor.scan(PROGRAM, 1), &subset);
        assert_eq!(selected.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_select_does_not_match_prefixes() {
        let extractor = IntegrityConstraintExtractor::new();
        let constraints = BTreeMap::from([(1, ":- ab.".to_string()), (2, ":- a(1).".to_string())]);
        let subset = UnsatisfiableSubset::new(vec![Assumption::positive("a(1)")]);

        let selected = extractor.select(constraints, &subset);
        assert_eq!(selected.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_select_falls_back_to_all() {
        let extractor = IntegrityConstraintExtractor::new();
        let subset = UnsatisfiableSubset::new(vec![Assumption::positive("zzz")]);

        let selected = extractor.select(extractor.scan(PROGRAM, 1), &subset);
        assert_eq!(selected.len(), 2);
    }

    #[tokio::test]
    async fn test_line_numbers_span_files() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, "a.\nb.\n").unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, ":- a, b.\n").unwrap();

        let files = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let subset = UnsatisfiableSubset::new(vec![Assumption::positive("a")]);
        let found = IntegrityConstraintExtractor::new()
            .extract_constraints(&files, &subset)
            .await
            .unwrap();

        assert_eq!(found, BTreeMap::from([(3, ":- a, b.".to_string())]));
    }
}
