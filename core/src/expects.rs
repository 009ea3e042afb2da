//! Cardinality expectations and the match-count check.
//!
//! A [`CardinalityPolicy`] turns "found N matches" into success or a
//! [`CardinalityError`]. `missing_ok` relaxes a zero count to success for
//! any expectation that would otherwise reject it.
//!
//! # Example
//!
//! ```
//! use overlay_match_core::*;
//!
//! let policy = CardinalityPolicy::default();
//! assert!(policy.check(&MatchResult::from_indices(vec![4])).is_ok());
//! assert!(policy.check(&MatchResult::default()).is_err());
//!
//! let optional = CardinalityPolicy { missing_ok: true, ..Default::default() };
//! assert!(optional.check(&MatchResult::default()).is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::{ArgValue, CardinalityError, MatchResult};

/// How many matches are acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    #[default]
    ExactlyOne,
    ZeroOrOne,
    OneOrMore,
    ZeroOrMore,
    /// Exactly `n` matches.
    Exactly(usize),
    /// At least `n` matches (`"n+"`).
    AtLeast(usize),
    /// Any of the listed counts (sorted, deduplicated).
    AnyOf(Vec<usize>),
}

impl Expectation {
    /// Builds the expectation for an explicit count.
    ///
    /// ```
    /// use overlay_match_core::Expectation;
    ///
    /// assert_eq!(Expectation::from_count(1), Expectation::ExactlyOne);
    /// assert_eq!(Expectation::from_count(3), Expectation::Exactly(3));
    /// ```
    pub fn from_count(n: usize) -> Self {
        match n {
            1 => Expectation::ExactlyOne,
            n => Expectation::Exactly(n),
        }
    }

    /// Builds the expectation for an `"n+"` lower bound.
    pub fn at_least(n: usize) -> Self {
        match n {
            0 => Expectation::ZeroOrMore,
            1 => Expectation::OneOrMore,
            n => Expectation::AtLeast(n),
        }
    }

    /// Builds the expectation for a list of allowed counts.
    ///
    /// ```
    /// use overlay_match_core::Expectation;
    ///
    /// assert_eq!(Expectation::any_of(vec![1, 0]), Expectation::ZeroOrOne);
    /// assert_eq!(Expectation::any_of(vec![2]), Expectation::Exactly(2));
    /// assert_eq!(Expectation::any_of(vec![3, 1, 3]), Expectation::AnyOf(vec![1, 3]));
    /// ```
    pub fn any_of(mut counts: Vec<usize>) -> Self {
        counts.sort_unstable();
        counts.dedup();
        match counts.as_slice() {
            [n] => Expectation::from_count(*n),
            [0, 1] => Expectation::ZeroOrOne,
            _ => Expectation::AnyOf(counts),
        }
    }

    /// Returns `true` if `n` matches satisfy this expectation on its own.
    pub fn allows(&self, n: usize) -> bool {
        match self {
            Expectation::ExactlyOne => n == 1,
            Expectation::ZeroOrOne => n <= 1,
            Expectation::OneOrMore => n >= 1,
            Expectation::ZeroOrMore => true,
            Expectation::Exactly(expected) => n == *expected,
            Expectation::AtLeast(min) => n >= *min,
            Expectation::AnyOf(counts) => counts.contains(&n),
        }
    }

    /// Human-readable form used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Expectation::ExactlyOne => "exactly one match".to_string(),
            Expectation::ZeroOrOne => "at most one match".to_string(),
            Expectation::OneOrMore => "at least one match".to_string(),
            Expectation::ZeroOrMore => "any number of matches".to_string(),
            Expectation::Exactly(n) => format!("exactly {n} matches"),
            Expectation::AtLeast(n) => format!("at least {n} matches"),
            Expectation::AnyOf(counts) => {
                let counts: Vec<String> = counts.iter().map(ToString::to_string).collect();
                format!("one of [{}] matches", counts.join(", "))
            }
        }
    }

    /// Parses an `expects` keyword value.
    ///
    /// `Ok(None)` is the `null` sentinel: leave the expectation unset so it
    /// is inherited from the enclosing defaults.
    pub fn from_arg(value: &ArgValue) -> Result<Option<Self>, String> {
        match value {
            ArgValue::None => Ok(None),
            ArgValue::Int(n) => count(*n).map(|n| Some(Expectation::from_count(n))),
            ArgValue::String(s) => parse_at_least(s).map(Some),
            ArgValue::List(items) => {
                if items.is_empty() {
                    return Err("expected a non-empty list of counts".to_string());
                }
                let counts = items
                    .iter()
                    .map(|item| match item {
                        ArgValue::Int(n) => count(*n),
                        other => Err(format!(
                            "expected list items to be int, but was {}",
                            other.type_name()
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Expectation::any_of(counts)))
            }
            other => Err(format!(
                "expected int, string or list of ints, but was {}",
                other.type_name()
            )),
        }
    }
}

fn count(n: i64) -> Result<usize, String> {
    usize::try_from(n).map_err(|_| format!("expected a non-negative count, but was {n}"))
}

fn parse_at_least(s: &str) -> Result<Expectation, String> {
    let digits = s
        .trim()
        .strip_suffix('+')
        .ok_or_else(|| format!("expected string of the form 'N+', but was '{s}'"))?;
    digits
        .parse::<usize>()
        .map(Expectation::at_least)
        .map_err(|_| format!("expected string of the form 'N+', but was '{s}'"))
}

/// Accepted match counts plus the missing-entry relaxation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardinalityPolicy {
    pub expects: Expectation,
    /// When `true`, zero matches succeed even if `expects` requires some.
    pub missing_ok: bool,
}

impl CardinalityPolicy {
    /// Classifies a match result.
    ///
    /// # Errors
    ///
    /// Returns a [`CardinalityError`] carrying the expected and found counts
    /// and the matched positions when the count is not acceptable.
    pub fn check(&self, result: &MatchResult) -> Result<(), CardinalityError> {
        let found = result.len();
        if self.expects.allows(found) || (found == 0 && self.missing_ok) {
            return Ok(());
        }
        Err(CardinalityError {
            expected: self.expects.clone(),
            missing_ok: self.missing_ok,
            found,
            indices: result.indices.clone(),
            positions: result.positions.clone(),
        })
    }
}
