//! Prompt composition for explanations.

use crate::solver::{PreprocessedProgram, UnsatisfiableSubset};
use std::collections::BTreeMap;
use std::fmt::Write;

const INSTRUCTIONS: &str = "\
You are an expert in Answer Set Programming (ASP).
A user's logic program has no answer set. You receive the program, a minimal \
unsatisfiable subset (MUS) of its facts, and the integrity constraints that \
the subset violates, each with its line number.
Explain in plain language why these facts cannot hold together. Refer to the \
constraints by line number, keep the explanation short, and do not rewrite \
the program.";

const NO_PROGRAM: &str = "(program read from standard input)";

/// The explanation prompt for one unsatisfiable program.
#[derive(Debug, Clone)]
pub struct ExplainTemplate<'a> {
    program: &'a PreprocessedProgram,
    subset: &'a UnsatisfiableSubset,
    constraints: &'a BTreeMap<usize, String>,
}

impl<'a> ExplainTemplate<'a> {
    /// Creates the template.
    #[must_use]
    pub fn new(
        program: &'a PreprocessedProgram,
        subset: &'a UnsatisfiableSubset,
        constraints: &'a BTreeMap<usize, String>,
    ) -> Self {
        Self {
            program,
            subset,
            constraints,
        }
    }

    /// The system instructions.
    #[must_use]
    pub fn compose_instructions(&self) -> String {
        INSTRUCTIONS.to_string()
    }

    /// The user input: program, subset, and constraints.
    #[must_use]
    pub fn compose_input(&self) -> String {
        let mut input = String::new();

        input.push_str("Program:\n```\n");
        input.push_str(self.program.program.as_deref().unwrap_or(NO_PROGRAM).trim_end());
        input.push_str("\n```\n\n");

        let _ = writeln!(input, "Assumptions: {}", self.program.assumptions.len());
        let _ = writeln!(input, "MUS: {}", self.subset);

        input.push_str("\nConstraints:\n");
        if self.constraints.is_empty() {
            input.push_str("(none found)\n");
        }
        for (line, text) in self.constraints {
            let _ = writeln!(input, "line {line}: {text}");
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Assumption, AssumptionSet};

    #[test]
    fn test_input_lists_subset_and_constraints() {
        let assumptions: AssumptionSet = [Assumption::positive("a"), Assumption::positive("b")]
            .into_iter()
            .collect();
        let program = PreprocessedProgram::new("{a}.\n{b}.\n:- a, b.\n", assumptions);
        let subset = UnsatisfiableSubset::new(vec![Assumption::positive("a"), Assumption::positive("b")]);
        let constraints = BTreeMap::from([(3, ":- a, b.".to_string())]);

        let input = ExplainTemplate::new(&program, &subset, &constraints).compose_input();

        assert!(input.contains("{a}.\n{b}.\n:- a, b.\n```"));
        assert!(input.contains("MUS: {a, b}"));
        assert!(input.contains("line 3: :- a, b."));
        assert!(input.contains("Assumptions: 2"));
    }

    #[test]
    fn test_input_without_program_text() {
        let program = PreprocessedProgram::empty();
        let subset = UnsatisfiableSubset::default();
        let constraints = BTreeMap::new();

        let template = ExplainTemplate::new(&program, &subset, &constraints);

        assert!(template.compose_input().contains(NO_PROGRAM));
        assert!(template.compose_input().contains("(none found)"));
        assert!(template.compose_instructions().contains("Answer Set Programming"));
    }
}
