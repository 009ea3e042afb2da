//! Error kinds raised while resolving and running a match.
//!
//! [`MatchError`] keeps the three failure classes apart so callers can tell
//! a bad annotation from a failing predicate or an unexpected match count.

use thiserror::Error;

use crate::{Expectation, Position};

/// Error raised by an external collaborator (evaluator or comparator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Invalid keyword options on a match annotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Keyword name not recognized by the annotation.
    #[error("unknown '{annotation}' annotation keyword argument '{keyword}'")]
    UnknownKeyword { annotation: String, keyword: String },
    /// Same keyword slot supplied twice.
    #[error("duplicate '{annotation}' annotation keyword argument '{keyword}'")]
    DuplicateKeyword { annotation: String, keyword: String },
    /// `by` was neither a string nor a callable.
    #[error(
        "expected '{annotation}' annotation keyword argument 'by' to be either string (for comparator name) or function, but was {found}"
    )]
    UnsupportedMatcher {
        annotation: String,
        found: &'static str,
    },
    /// `expects` could not be parsed.
    #[error("invalid '{annotation}' annotation keyword argument 'expects': {reason}")]
    InvalidExpects { annotation: String, reason: String },
    /// `missing_ok` was not a bool.
    #[error(
        "expected '{annotation}' annotation keyword argument 'missing_ok' to be a bool, but was {found}"
    )]
    InvalidMissingOk {
        annotation: String,
        found: &'static str,
    },
}

/// Failure while invoking a comparator or predicate during a scan.
///
/// `index` is the position of the candidate entry that was being tested
/// when the scan aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("comparator '{name}' failed on entry {index}: {source}")]
    Comparator {
        name: String,
        index: usize,
        source: ScriptError,
    },
    #[error("matcher function '{callable}' failed on entry {index}: {source}")]
    Invocation {
        callable: String,
        index: usize,
        source: ScriptError,
    },
    #[error("matcher function '{callable}' returned a non-boolean result on entry {index}: {source}")]
    Coercion {
        callable: String,
        index: usize,
        source: ScriptError,
    },
}

/// Number of matches did not satisfy the expectation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", self.describe())]
pub struct CardinalityError {
    pub expected: Expectation,
    pub missing_ok: bool,
    pub found: usize,
    /// Indices of the matched entries (empty when none matched).
    pub indices: Vec<usize>,
    /// Positions of the matched entries, parallel to `indices`.
    pub positions: Vec<Position>,
}

impl CardinalityError {
    fn describe(&self) -> String {
        let found = match self.found {
            0 => "none".to_string(),
            n => n.to_string(),
        };
        let mut msg = format!("expected {}, found {found}", self.expected.describe());
        let at: Vec<String> = self
            .positions
            .iter()
            .filter(|p| !p.is_unknown())
            .map(ToString::to_string)
            .collect();
        if !at.is_empty() {
            msg.push_str(&format!(" (matched at {})", at.join(", ")));
        }
        msg
    }
}

/// Any failure of a match operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Cardinality(#[from] CardinalityError),
}

impl MatchError {
    /// Stable short name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::Configuration(_) => "configuration",
            MatchError::Evaluation(_) => "evaluation",
            MatchError::Cardinality(_) => "cardinality",
        }
    }
}
