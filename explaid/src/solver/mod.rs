//! Solving collaborators: preprocessing, the satisfiability pre-check,
//! unsatisfiable core computation, and constraint extraction.
//!
//! The pipeline only depends on the traits in this module. The concrete
//! implementations drive the `clingo` executable and scan program text.

mod clingo;
mod constraints;
mod preprocess;
mod program;

pub use clingo::{
    reads_stdin, shrink_core, with_assumptions, ClingoSolver, Verdict, DEFAULT_CLINGO,
};
pub use constraints::IntegrityConstraintExtractor;
pub use preprocess::{read_input, AspPreprocessor, STDIN_SENTINEL};
pub use program::{Assumption, AssumptionSet, PreprocessedProgram, UnsatisfiableSubset};

use crate::errors::StageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Merges input files into one program and extracts its assumptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Preprocessor: Send + Sync {
    /// Returns `(None, empty)` for an empty file list.
    async fn preprocess(&self, files: &[PathBuf]) -> Result<PreprocessedProgram, StageError>;
}

/// Decides satisfiability of the input, synchronously.
#[cfg_attr(test, mockall::automock)]
pub trait SatisfiabilityChecker: Send + Sync {
    /// An empty file list means standard input.
    fn check_satisfiable(&self, files: &[PathBuf]) -> Result<bool, StageError>;
}

/// Computes a minimal unsatisfiable subset of the assumptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CoreComputer: Send + Sync {
    /// Returns `None` when the program is satisfiable under all assumptions.
    async fn compute_core(
        &self,
        program: &str,
        assumptions: &AssumptionSet,
    ) -> Result<Option<UnsatisfiableSubset>, StageError>;
}

/// Finds the program constraints that take part in the conflict.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConstraintExtractor: Send + Sync {
    /// Returns line number → constraint text.
    async fn extract_constraints(
        &self,
        files: &[PathBuf],
        subset: &UnsatisfiableSubset,
    ) -> Result<BTreeMap<usize, String>, StageError>;
}
