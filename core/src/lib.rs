//! Entry matching for structural document overlays.
//!
//! When an overlay document edits a base document, every new mapping entry
//! has to be paired with the base entries it refers to before anything is
//! inserted, replaced or removed. This crate does that pairing:
//!
//! - [`Node`] / [`Entry`]: the document model the matcher reads.
//! - [`Matcher`]: key equality, a named comparator, or a predicate
//!   function run by an external [`Evaluator`].
//! - [`CardinalityPolicy`]: how many matches are acceptable
//!   ([`Expectation`]) and whether a missing entry is tolerated.
//! - [`MatchAnnotation::resolve`]: turns `overlay/match` keyword options
//!   plus inherited [`MatchDefaults`] into a matcher and a policy.
//! - [`match_entry`]: resolve, scan and check in one call.
//!
//! # Example
//!
//! ```
//! use overlay_match_core::*;
//!
//! let base = vec![
//!     Entry::new("web", vec![Entry::new("name", "web")]),
//!     Entry::new("db", vec![Entry::new("name", "db")]),
//! ];
//! let new_entry = Entry::new("frontend", vec![Entry::new("name", "web")]);
//!
//! let evaluator = FunctionTable::new();
//! let comparators = Comparators::new().with_map_key_fallback();
//! let ctx = MatchContext::new(&evaluator, &comparators);
//!
//! let annotation = Annotation::new(ANNOTATION_MATCH)
//!     .with_kwarg(KWARG_BY, ArgValue::String("name".into()));
//! let indices = match_entry(&annotation, &MatchDefaults::default(), &base, &new_entry, &ctx).unwrap();
//! assert_eq!(indices, vec![0]);
//! ```

mod annotation;
mod compare;
mod error;
mod eval;
mod executor;
mod expects;
mod matcher;
mod types;

pub use annotation::{
    ANNOTATION_MATCH, ANNOTATION_MATCH_CHILD_DEFAULTS, Annotation, ArgValue, KWARG_BY,
    KWARG_EXPECTS, KWARG_MISSING_OK, KWARG_MISSING_OK_ALIAS, MatchAnnotation, MatchDefaults,
};
pub use compare::{ComparatorRegistry, Comparators, compare_by_map_key};
pub use error::{CardinalityError, ConfigurationError, EvaluationError, MatchError, ScriptError};
pub use eval::{Callable, Evaluator, FunctionTable, Truthiness};
pub use executor::match_entry;
pub use expects::{CardinalityPolicy, Expectation};
pub use matcher::{MatchContext, MatchResult, Matcher};
pub use types::{Entry, Node, Position, deep_equal};
