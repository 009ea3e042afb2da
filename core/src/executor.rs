//! Match execution: resolve, scan, check.
//!
//! [`match_entry`] runs the whole pipeline for one new entry and hands back
//! the matched indices the merge step should act on.
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
//! let annotation = Annotation::new(ANNOTATION_MATCH);
//! let err = match_entry(&annotation, &MatchDefaults::default(), &base, &Entry::new("a", 0), &ctx)
//!     .unwrap_err();
//! assert_eq!(err.kind(), "cardinality");
//!
//! let annotation = Annotation::new(ANNOTATION_MATCH).with_kwarg("expects", ArgValue::String("1+".into()));
//! let indices = match_entry(&annotation, &MatchDefaults::default(), &base, &Entry::new("a", 0), &ctx)
//!     .unwrap();
//! assert_eq!(indices, vec![0, 2]);
//! ```

use tracing::debug;

use crate::{
    Annotation, Entry, MatchAnnotation, MatchContext, MatchDefaults, MatchError, MatchResult,
};

impl MatchAnnotation {
    /// Scans `collection` and applies the cardinality policy.
    ///
    /// On success returns the ascending matched indices, which may be empty
    /// when `missing_ok` allowed an absent entry.
    ///
    /// # Errors
    ///
    /// [`MatchError::Evaluation`] when the matcher fails, and
    /// [`MatchError::Cardinality`] when the match count is not acceptable.
    pub fn indexes(
        &self,
        collection: &[Entry],
        new_entry: &Entry,
        ctx: &MatchContext<'_>,
    ) -> Result<Vec<usize>, MatchError> {
        let result = self.match_nodes(collection, new_entry, ctx)?;
        Ok(result.indices)
    }

    /// Like [`indexes`](Self::indexes) but keeps the matched positions.
    pub fn match_nodes(
        &self,
        collection: &[Entry],
        new_entry: &Entry,
        ctx: &MatchContext<'_>,
    ) -> Result<MatchResult, MatchError> {
        let result = self.matcher.scan(collection, new_entry, ctx)?;
        self.policy.check(&result)?;
        debug!(key = %new_entry.key, matched = result.len(), "Match accepted");
        Ok(result)
    }
}

/// Resolves `annotation` against `defaults`, then matches `new_entry`
/// against `collection`.
///
/// # Errors
///
/// Configuration, evaluation and cardinality failures are returned as the
/// matching [`MatchError`] variant; nothing is retried.
pub fn match_entry(
    annotation: &Annotation,
    defaults: &MatchDefaults,
    collection: &[Entry],
    new_entry: &Entry,
    ctx: &MatchContext<'_>,
) -> Result<Vec<usize>, MatchError> {
    let resolved = MatchAnnotation::resolve(annotation, defaults)?;
    resolved.indexes(collection, new_entry, ctx)
}
