//! Matcher strategies.
//!
//! A [`Matcher`] scans a base mapping's entries in order and reports the
//! indices that correspond to the new entry. Scans never mutate the
//! collection, and a failing comparator or predicate aborts the scan with
//! no partial result.
//!
//! # Example
//!
//! ```
//! use overlay_match_core::*;
//!
//! let base = vec![Entry::new("a", 1), Entry::new("b", 2), Entry::new("a", 3)];
//! let evaluator = FunctionTable::new();
//! let comparators = Comparators::new();
//! let ctx = MatchContext::new(&evaluator, &comparators);
//!
//! let result = Matcher::KeyEquality.scan(&base, &Entry::new("a", 0), &ctx).unwrap();
//! assert_eq!(result.indices, vec![0, 2]);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Callable, ComparatorRegistry, Entry, EvaluationError, Evaluator, Position, deep_equal,
};

/// Strategy deciding whether a candidate entry matches the new entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Keys are structurally equal.
    #[default]
    KeyEquality,
    /// A registered comparator reports a match.
    NamedComparator(String),
    /// A callable invoked with (candidate key, candidate value, new value)
    /// returns a truthy result.
    Predicate(Callable),
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::KeyEquality => write!(f, "key equality"),
            Matcher::NamedComparator(name) => write!(f, "comparator '{name}'"),
            Matcher::Predicate(callable) => write!(f, "function '{callable}'"),
        }
    }
}

/// Collaborators a scan may call out to.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub evaluator: &'a dyn Evaluator,
    pub comparators: &'a dyn ComparatorRegistry,
}

impl<'a> MatchContext<'a> {
    pub fn new(evaluator: &'a dyn Evaluator, comparators: &'a dyn ComparatorRegistry) -> Self {
        Self {
            evaluator,
            comparators,
        }
    }
}

/// Indices of matched entries in ascending order, with their positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub indices: Vec<usize>,
    /// Parallel to `indices`.
    pub positions: Vec<Position>,
}

impl MatchResult {
    /// Builds a result with unknown positions.
    pub fn from_indices(indices: Vec<usize>) -> Self {
        let positions = vec![Position::unknown(); indices.len()];
        Self { indices, positions }
    }

    /// Number of matched entries.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push(&mut self, index: usize, entry: &Entry) {
        self.indices.push(index);
        self.positions.push(entry.position.clone());
    }
}

impl Matcher {
    /// Scans `collection` in order for entries matching `new_entry`.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] for the first candidate whose
    /// comparator or predicate fails. Key equality never fails.
    pub fn scan(
        &self,
        collection: &[Entry],
        new_entry: &Entry,
        ctx: &MatchContext<'_>,
    ) -> Result<MatchResult, EvaluationError> {
        let mut result = MatchResult::default();

        match self {
            Matcher::KeyEquality => {
                for (index, entry) in collection.iter().enumerate() {
                    if deep_equal(&entry.key, &new_entry.key) {
                        result.push(index, entry);
                    }
                }
            }
            Matcher::NamedComparator(name) => {
                for (index, entry) in collection.iter().enumerate() {
                    let matched = ctx
                        .comparators
                        .compare(name, entry, new_entry)
                        .map_err(|source| EvaluationError::Comparator {
                            name: name.clone(),
                            index,
                            source,
                        })?;
                    if matched {
                        result.push(index, entry);
                    }
                }
            }
            Matcher::Predicate(callable) => {
                for (index, entry) in collection.iter().enumerate() {
                    let args = [
                        entry.key.clone(),
                        entry.value.clone(),
                        new_entry.value.clone(),
                    ];
                    let value = ctx.evaluator.invoke(callable, &args).map_err(|source| {
                        EvaluationError::Invocation {
                            callable: callable.name.clone(),
                            index,
                            source,
                        }
                    })?;
                    let matched = ctx.evaluator.to_bool(&value).map_err(|source| {
                        EvaluationError::Coercion {
                            callable: callable.name.clone(),
                            index,
                            source,
                        }
                    })?;
                    if matched {
                        result.push(index, entry);
                    }
                }
            }
        }

        debug!(matcher = %self, candidates = collection.len(), matched = ?result.indices, "Scanned entries");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{Comparators, FunctionTable, Node, ScriptError, Truthiness};

    use super::*;

    fn keyed(keys: &[&str]) -> Vec<Entry> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| {
                Entry::new(*k, i as i64).with_position(Position::new("base.yml").with_line(i + 1))
            })
            .collect()
    }

    #[test]
    fn test_key_equality_returns_all_equal_keys_in_order() {
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base = keyed(&["a", "b", "a", "c", "a"]);
        let result = Matcher::KeyEquality
            .scan(&base, &Entry::new("a", Node::Null), &ctx)
            .unwrap();
        assert_eq!(result.indices, vec![0, 2, 4]);
        assert_eq!(result.positions[1], Position::new("base.yml").with_line(3));
    }

    #[test]
    fn test_key_equality_is_structural() {
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base = vec![
            Entry::new(Node::Int(1), "int"),
            Entry::new(Node::Float(1.0), "float"),
            Entry::new("1", "string"),
        ];
        let result = Matcher::KeyEquality
            .scan(&base, &Entry::new(Node::Int(1), Node::Null), &ctx)
            .unwrap();
        assert_eq!(result.indices, vec![0]);
    }

    #[test]
    fn test_named_comparator_matches() {
        let evaluator = FunctionTable::new();
        let mut comparators = Comparators::new();
        comparators.register("nameMatch", |candidate, _| {
            Ok(candidate.value.get("name") == Some(&Node::from("svc")))
        });
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base: Vec<Entry> = ["a", "b", "c", "svc", "d"]
            .iter()
            .map(|name| Entry::new(*name, vec![Entry::new("name", *name)]))
            .collect();
        let new_entry = Entry::new("svc", vec![Entry::new("name", "svc")]);
        let matcher = Matcher::NamedComparator("nameMatch".into());

        let first = matcher.scan(&base, &new_entry, &ctx).unwrap();
        let second = matcher.scan(&base, &new_entry, &ctx).unwrap();
        assert_eq!(first.indices, vec![3]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_named_comparator_error_aborts_scan() {
        let evaluator = FunctionTable::new();
        let calls = std::rc::Rc::new(Cell::new(0));
        let seen = calls.clone();
        let mut comparators = Comparators::new();
        comparators.register("picky", move |candidate, _| {
            seen.set(seen.get() + 1);
            match &candidate.value {
                Node::Int(_) => Ok(true),
                other => Err(ScriptError::new(format!("cannot compare {}", other.type_name()))),
            }
        });
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base = vec![
            Entry::new("a", 1),
            Entry::new("b", "two"),
            Entry::new("c", 3),
        ];
        let err = Matcher::NamedComparator("picky".into())
            .scan(&base, &Entry::new("a", 1), &ctx)
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::Comparator {
                name: "picky".into(),
                index: 1,
                source: ScriptError::new("cannot compare string"),
            }
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unknown_comparator_is_evaluation_error() {
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let err = Matcher::NamedComparator("nope".into())
            .scan(&keyed(&["a"]), &Entry::new("a", 0), &ctx)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Comparator { index: 0, .. }));
    }

    #[test]
    fn test_unknown_comparator_on_empty_collection_is_not_called() {
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let result = Matcher::NamedComparator("nope".into())
            .scan(&[], &Entry::new("a", 0), &ctx)
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_predicate_receives_key_value_and_new_value() {
        let mut evaluator = FunctionTable::new();
        evaluator.register("bigger", 3, |args| match (&args[1], &args[2]) {
            (Node::Int(left), Node::Int(right)) => Ok(Node::Bool(left > right)),
            _ => Ok(Node::Bool(false)),
        });
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base = keyed(&["a", "b", "c", "d"]);
        let result = Matcher::Predicate(Callable::new("bigger"))
            .scan(&base, &Entry::new("x", 1), &ctx)
            .unwrap();
        assert_eq!(result.indices, vec![2, 3]);
    }

    #[test]
    fn test_predicate_uses_evaluator_truthiness() {
        let mut evaluator = FunctionTable::new();
        evaluator.register("key", 3, |args| Ok(args[0].clone()));
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let base = vec![Entry::new("", 0), Entry::new("x", 0)];
        let result = Matcher::Predicate(Callable::new("key"))
            .scan(&base, &Entry::new("x", 0), &ctx)
            .unwrap();
        assert_eq!(result.indices, vec![1]);

        let strict = {
            let mut table = FunctionTable::new().with_truthiness(Truthiness::Strict);
            table.register("key", 3, |args| Ok(args[0].clone()));
            table
        };
        let ctx = MatchContext::new(&strict, &comparators);
        let err = Matcher::Predicate(Callable::new("key"))
            .scan(&base, &Entry::new("x", 0), &ctx)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Coercion { index: 0, .. }));
    }

    #[test]
    fn test_predicate_failure_discards_partial_result() {
        let mut evaluator = FunctionTable::new();
        evaluator.register("fails_on_c", 3, |args| {
            if args[0] == Node::from("c") {
                Err(ScriptError::new("fail: bad entry"))
            } else {
                Ok(Node::Bool(true))
            }
        });
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let err = Matcher::Predicate(Callable::new("fails_on_c"))
            .scan(&keyed(&["a", "b", "c", "d"]), &Entry::new("x", 0), &ctx)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "matcher function 'fails_on_c' failed on entry 2: fail: bad entry"
        );
    }

    #[test]
    fn test_predicate_wrong_arity() {
        let mut evaluator = FunctionTable::new();
        evaluator.register("two_args", 2, |_| Ok(Node::Bool(true)));
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);

        let err = Matcher::Predicate(Callable::new("two_args"))
            .scan(&keyed(&["a"]), &Entry::new("a", 0), &ctx)
            .unwrap_err();
        assert!(matches!(err, EvaluationError::Invocation { index: 0, .. }));
    }
}
