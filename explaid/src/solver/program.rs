//! Values passed between the solving stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ground atom assumed to hold (or not).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assumption {
    /// The atom, e.g. `p(1,a)`.
    pub symbol: String,
    /// The assumed truth value.
    pub value: bool,
}

impl Assumption {
    /// An assumption that `symbol` holds.
    #[must_use]
    pub fn positive(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            value: true,
        }
    }

    /// An assumption that `symbol` does not hold.
    #[must_use]
    pub fn negative(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            value: false,
        }
    }

    /// The predicate name, e.g. `p` for `p(1,a)`.
    #[must_use]
    pub fn predicate(&self) -> &str {
        let end = self.symbol.find('(').unwrap_or(self.symbol.len());
        self.symbol[..end].trim()
    }

    /// The assumption written as a program fact or constraint.
    ///
    /// `p(1).` for a positive assumption, `:- p(1).` for a negative one.
    #[must_use]
    pub fn as_rule(&self) -> String {
        if self.value {
            format!("{}.", self.symbol)
        } else {
            format!(":- {}.", self.symbol)
        }
    }
}

impl fmt::Display for Assumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value {
            write!(f, "{}", self.symbol)
        } else {
            write!(f, "not {}", self.symbol)
        }
    }
}

/// An ordered set of assumptions without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumptionSet {
    items: Vec<Assumption>,
}

impl AssumptionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assumption unless already present. Returns whether it was added.
    pub fn insert(&mut self, assumption: Assumption) -> bool {
        if self.items.contains(&assumption) {
            return false;
        }
        self.items.push(assumption);
        true
    }

    /// Whether the set contains `assumption`.
    #[must_use]
    pub fn contains(&self, assumption: &Assumption) -> bool {
        self.items.contains(assumption)
    }

    /// Iterates the assumptions in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Assumption> {
        self.items.iter()
    }

    /// Number of assumptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The assumptions as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Assumption] {
        &self.items
    }
}

impl FromIterator<Assumption> for AssumptionSet {
    fn from_iter<T: IntoIterator<Item = Assumption>>(iter: T) -> Self {
        let mut set = Self::new();
        for assumption in iter {
            set.insert(assumption);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AssumptionSet {
    type Item = &'a Assumption;
    type IntoIter = std::slice::Iter<'a, Assumption>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The result of preprocessing the input files.
///
/// Built once and shared read-only with the later stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessedProgram {
    /// The merged, rewritten program text; `None` when no files were given.
    pub program: Option<String>,
    /// The assumptions extracted from the program's facts.
    pub assumptions: AssumptionSet,
}

impl PreprocessedProgram {
    /// A program with text and assumptions.
    #[must_use]
    pub fn new(program: impl Into<String>, assumptions: AssumptionSet) -> Self {
        Self {
            program: Some(program.into()),
            assumptions,
        }
    }

    /// The result for an empty file list.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A minimal set of assumptions that cannot hold together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsatisfiableSubset {
    /// The assumptions in the subset.
    pub assumptions: Vec<Assumption>,
}

impl UnsatisfiableSubset {
    /// Creates a subset.
    #[must_use]
    pub fn new(assumptions: Vec<Assumption>) -> Self {
        Self { assumptions }
    }

    /// Distinct predicate names in the subset, sorted.
    #[must_use]
    pub fn predicates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.assumptions.iter().map(Assumption::predicate).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Number of assumptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assumptions.len()
    }

    /// Whether the subset is empty, i.e. the program is unsatisfiable without
    /// any assumption.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assumptions.is_empty()
    }
}

impl fmt::Display for UnsatisfiableSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.assumptions.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assumption_predicate() {
        assert_eq!(Assumption::positive("edge(1,2)").predicate(), "edge");
        assert_eq!(Assumption::positive("flag").predicate(), "flag");
    }

    #[test]
    fn test_assumption_as_rule() {
        assert_eq!(Assumption::positive("a(1)").as_rule(), "a(1).");
        assert_eq!(Assumption::negative("a(1)").as_rule(), ":- a(1).");
    }

    #[test]
    fn test_assumption_set_deduplicates() {
        let set: AssumptionSet = [
            Assumption::positive("a"),
            Assumption::positive("b"),
            Assumption::positive("a"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert!(set.contains(&Assumption::positive("b")));
        assert!(!set.contains(&Assumption::negative("b")));
    }

    #[test]
    fn test_subset_display_and_predicates() {
        let subset = UnsatisfiableSubset::new(vec![
            Assumption::positive("q(2)"),
            Assumption::positive("p(1)"),
            Assumption::negative("q(3)"),
        ]);

        assert_eq!(subset.to_string(), "{q(2), p(1), not q(3)}");
        assert_eq!(subset.predicates(), vec!["p", "q"]);
    }

    #[test]
    fn test_empty_program() {
        let program = PreprocessedProgram::empty();
        assert!(program.program.is_none());
        assert!(program.assumptions.is_empty());
    }
}
