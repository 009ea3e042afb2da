//! Named comparators.
//!
//! A comparator decides whether a candidate entry corresponds to the new
//! entry. [`Comparators`] keeps registered comparators by name and can fall
//! back to comparing a mapping key shared by both entries' values.

use std::collections::HashMap;
use std::fmt;

use crate::{Entry, Node, ScriptError, deep_equal};

/// Resolves comparator names and runs them.
pub trait ComparatorRegistry {
    /// Compares `candidate` with `new_entry` using the comparator `name`.
    fn compare(&self, name: &str, candidate: &Entry, new_entry: &Entry)
    -> Result<bool, ScriptError>;
}

type Comparator = Box<dyn Fn(&Entry, &Entry) -> Result<bool, ScriptError>>;

/// In-process comparator registry.
///
/// # Examples
///
/// ```
/// use overlay_match_core::*;
///
/// let mut comparators = Comparators::new();
/// comparators.register("same_key", |candidate, new_entry| Ok(candidate.key == new_entry.key));
///
/// let a = Entry::new("web", 1);
/// assert_eq!(comparators.compare("same_key", &a, &Entry::new("web", 2)), Ok(true));
/// assert!(comparators.compare("unknown", &a, &a).is_err());
///
/// // With the fallback, an unregistered name compares that mapping key.
/// let comparators = Comparators::new().with_map_key_fallback();
/// let svc = Entry::new("svc", vec![Entry::new("name", "web")]);
/// assert_eq!(comparators.compare("name", &svc, &svc), Ok(true));
/// ```
#[derive(Default)]
pub struct Comparators {
    named: HashMap<String, Comparator>,
    map_key_fallback: bool,
}

impl Comparators {
    /// Creates an empty registry; unknown names are errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats unregistered names as mapping keys to compare.
    pub fn with_map_key_fallback(mut self) -> Self {
        self.map_key_fallback = true;
        self
    }

    /// Registers `comparator` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, comparator: F)
    where
        F: Fn(&Entry, &Entry) -> Result<bool, ScriptError> + 'static,
    {
        self.named.insert(name.into(), Box::new(comparator));
    }
}

impl fmt::Debug for Comparators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Comparators")
            .field("named", &names)
            .field("map_key_fallback", &self.map_key_fallback)
            .finish()
    }
}

impl ComparatorRegistry for Comparators {
    fn compare(
        &self,
        name: &str,
        candidate: &Entry,
        new_entry: &Entry,
    ) -> Result<bool, ScriptError> {
        if let Some(comparator) = self.named.get(name) {
            return comparator(candidate, new_entry);
        }
        if self.map_key_fallback {
            return compare_by_map_key(name, candidate, new_entry);
        }
        Err(ScriptError::new(format!("unknown comparator '{name}'")))
    }
}

/// Compares the values stored under mapping key `key` in both entries.
///
/// The new entry must carry a mapping value with `key`. A candidate whose
/// value is not a mapping is a type mismatch; a candidate mapping without
/// `key` simply does not match.
pub fn compare_by_map_key(
    key: &str,
    candidate: &Entry,
    new_entry: &Entry,
) -> Result<bool, ScriptError> {
    let expected = match &new_entry.value {
        Node::Mapping(_) => new_entry.value.get(key).ok_or_else(|| {
            ScriptError::new(format!(
                "expected to find mapping key '{key}' in new entry value"
            ))
        })?,
        other => {
            return Err(ScriptError::new(format!(
                "expected new entry value to be a mapping, but was {}",
                other.type_name()
            )));
        }
    };

    match &candidate.value {
        Node::Mapping(_) => Ok(candidate
            .value
            .get(key)
            .is_some_and(|actual| deep_equal(actual, expected))),
        other => Err(ScriptError::new(format!(
            "expected candidate value to be a mapping, but was {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(name: &str) -> Entry {
        Entry::new(name, vec![Entry::new("name", name), Entry::new("port", 80)])
    }

    #[test]
    fn test_registered_comparator_wins_over_fallback() {
        let mut comparators = Comparators::new().with_map_key_fallback();
        comparators.register("name", |_, _| Ok(false));
        assert_eq!(comparators.compare("name", &svc("a"), &svc("a")), Ok(false));
    }

    #[test]
    fn test_unknown_comparator_without_fallback() {
        let comparators = Comparators::new();
        let err = comparators
            .compare("name", &svc("a"), &svc("a"))
            .unwrap_err();
        assert_eq!(err.message, "unknown comparator 'name'");
    }

    #[test]
    fn test_map_key_compares_values() {
        assert_eq!(compare_by_map_key("name", &svc("a"), &svc("a")), Ok(true));
        assert_eq!(compare_by_map_key("name", &svc("a"), &svc("b")), Ok(false));
        assert_eq!(compare_by_map_key("port", &svc("a"), &svc("b")), Ok(true));
    }

    #[test]
    fn test_map_key_candidate_without_key_does_not_match() {
        let candidate = Entry::new("x", vec![Entry::new("other", 1)]);
        assert_eq!(compare_by_map_key("name", &candidate, &svc("a")), Ok(false));
    }

    #[test]
    fn test_map_key_type_mismatches() {
        let scalar = Entry::new("x", Node::Int(1));
        let err = compare_by_map_key("name", &scalar, &svc("a")).unwrap_err();
        assert_eq!(
            err.message,
            "expected candidate value to be a mapping, but was int"
        );

        let err = compare_by_map_key("name", &svc("a"), &scalar).unwrap_err();
        assert_eq!(
            err.message,
            "expected new entry value to be a mapping, but was int"
        );

        let err = compare_by_map_key("missing", &svc("a"), &svc("a")).unwrap_err();
        assert_eq!(
            err.message,
            "expected to find mapping key 'missing' in new entry value"
        );
    }
}
