//! Match annotation resolution.
//!
//! An [`Annotation`] is the already-parsed list of keyword options attached
//! to a new entry. [`MatchAnnotation::resolve`] turns the `overlay/match`
//! options into a [`Matcher`] and a [`CardinalityPolicy`], filling unset
//! fields from the enclosing [`MatchDefaults`].
//!
//! # Examples
//!
//! ```
//! use overlay_match_core::*;
//!
//! let annotation = Annotation::new(ANNOTATION_MATCH)
//!     .with_kwarg("by", ArgValue::String("name".into()))
//!     .with_kwarg("expects", ArgValue::String("1+".into()));
//!
//! let resolved = MatchAnnotation::resolve(&annotation, &MatchDefaults::default()).unwrap();
//! assert_eq!(resolved.matcher, Matcher::NamedComparator("name".into()));
//! assert_eq!(resolved.policy.expects, Expectation::OneOrMore);
//! assert!(!resolved.policy.missing_ok);
//!
//! // Unknown keywords are rejected, never ignored.
//! let bad = Annotation::new(ANNOTATION_MATCH).with_kwarg("byKey", ArgValue::None);
//! assert!(MatchAnnotation::resolve(&bad, &MatchDefaults::default()).is_err());
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Callable, CardinalityPolicy, ConfigurationError, Expectation, Matcher};

/// Name of the annotation selecting how a new entry is matched.
pub const ANNOTATION_MATCH: &str = "overlay/match";
/// Name of the annotation carrying defaults for nested entries.
pub const ANNOTATION_MATCH_CHILD_DEFAULTS: &str = "overlay/match_child_defaults";

pub const KWARG_BY: &str = "by";
pub const KWARG_EXPECTS: &str = "expects";
pub const KWARG_MISSING_OK: &str = "missing_ok";
/// Accepted spelling of [`KWARG_MISSING_OK`].
pub const KWARG_MISSING_OK_ALIAS: &str = "missingOK";

/// Value of a keyword option, as produced by the annotation parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ArgValue>),
    Callable(Callable),
}

impl ArgValue {
    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::None => "NoneType",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::String(_) => "string",
            ArgValue::List(_) => "list",
            ArgValue::Callable(_) => "function",
        }
    }
}

/// Keyword options of one annotation, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub kwargs: Vec<(String, ArgValue)>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kwargs: Vec::new(),
        }
    }

    /// Appends a keyword option.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.kwargs.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    By,
    Expects,
    MissingOk,
}

impl Slot {
    fn keyword(self) -> &'static str {
        match self {
            Slot::By => KWARG_BY,
            Slot::Expects => KWARG_EXPECTS,
            Slot::MissingOk => KWARG_MISSING_OK,
        }
    }
}

fn slot_for(keyword: &str) -> Option<Slot> {
    match keyword {
        KWARG_BY => Some(Slot::By),
        KWARG_EXPECTS => Some(Slot::Expects),
        KWARG_MISSING_OK | KWARG_MISSING_OK_ALIAS => Some(Slot::MissingOk),
        _ => None,
    }
}

/// Walks the kwargs once, mapping each onto one of `allowed` slots.
///
/// Unknown keywords and a second value for the same slot are errors.
fn collect_slots<'a>(
    annotation: &'a Annotation,
    allowed: &[Slot],
) -> Result<Vec<(Slot, &'a ArgValue)>, ConfigurationError> {
    let mut slots: Vec<(Slot, &ArgValue)> = Vec::new();
    for (keyword, value) in &annotation.kwargs {
        let slot = slot_for(keyword)
            .filter(|slot| allowed.contains(slot))
            .ok_or_else(|| ConfigurationError::UnknownKeyword {
                annotation: annotation.name.clone(),
                keyword: keyword.clone(),
            })?;
        if slots.iter().any(|(seen, _)| *seen == slot) {
            return Err(ConfigurationError::DuplicateKeyword {
                annotation: annotation.name.clone(),
                keyword: slot.keyword().to_string(),
            });
        }
        slots.push((slot, value));
    }
    Ok(slots)
}

fn parse_expects(
    annotation: &Annotation,
    value: &ArgValue,
) -> Result<Option<Expectation>, ConfigurationError> {
    Expectation::from_arg(value).map_err(|reason| ConfigurationError::InvalidExpects {
        annotation: annotation.name.clone(),
        reason,
    })
}

fn parse_missing_ok(
    annotation: &Annotation,
    value: &ArgValue,
) -> Result<Option<bool>, ConfigurationError> {
    match value {
        ArgValue::None => Ok(None),
        ArgValue::Bool(b) => Ok(Some(*b)),
        other => Err(ConfigurationError::InvalidMissingOk {
            annotation: annotation.name.clone(),
            found: other.type_name(),
        }),
    }
}

/// Cardinality defaults inherited from an enclosing scope.
///
/// Unset fields fall through to the next scope out, and finally to
/// exactly-one / `missing_ok = false`.
///
/// # Examples
///
/// ```
/// use overlay_match_core::*;
///
/// let outer = MatchDefaults { expects: Some(Expectation::ZeroOrMore), missing_ok: Some(true) };
/// let inner = MatchDefaults { expects: Some(Expectation::OneOrMore), missing_ok: None };
///
/// let effective = inner.inherit(&outer);
/// assert_eq!(effective.expects, Some(Expectation::OneOrMore));
/// assert_eq!(effective.missing_ok, Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expects: Option<Expectation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_ok: Option<bool>,
}

impl MatchDefaults {
    /// Reads defaults from a `overlay/match_child_defaults` annotation.
    ///
    /// Only `expects` and `missing_ok` are accepted.
    pub fn from_annotation(annotation: &Annotation) -> Result<Self, ConfigurationError> {
        let mut defaults = Self::default();
        for (slot, value) in collect_slots(annotation, &[Slot::Expects, Slot::MissingOk])? {
            match slot {
                Slot::Expects => defaults.expects = parse_expects(annotation, value)?,
                Slot::MissingOk => defaults.missing_ok = parse_missing_ok(annotation, value)?,
                // rejected by collect_slots
                Slot::By => {}
            }
        }
        Ok(defaults)
    }

    /// Fills unset fields from `parent`.
    pub fn inherit(&self, parent: &MatchDefaults) -> MatchDefaults {
        MatchDefaults {
            expects: self.expects.clone().or_else(|| parent.expects.clone()),
            missing_ok: self.missing_ok.or(parent.missing_ok),
        }
    }
}

/// Resolved matcher and cardinality policy for one new entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchAnnotation {
    pub matcher: Matcher,
    pub policy: CardinalityPolicy,
}

impl MatchAnnotation {
    /// Resolves an `overlay/match` annotation against inherited defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for unknown or repeated keywords, a
    /// `by` that is neither string nor callable, or malformed `expects` /
    /// `missing_ok` values.
    pub fn resolve(
        annotation: &Annotation,
        defaults: &MatchDefaults,
    ) -> Result<Self, ConfigurationError> {
        let mut matcher = Matcher::KeyEquality;
        let mut explicit = MatchDefaults::default();

        for (slot, value) in
            collect_slots(annotation, &[Slot::By, Slot::Expects, Slot::MissingOk])?
        {
            match slot {
                Slot::By => {
                    matcher = match value {
                        ArgValue::String(name) => Matcher::NamedComparator(name.clone()),
                        ArgValue::Callable(callable) => Matcher::Predicate(callable.clone()),
                        other => {
                            return Err(ConfigurationError::UnsupportedMatcher {
                                annotation: annotation.name.clone(),
                                found: other.type_name(),
                            });
                        }
                    };
                }
                Slot::Expects => explicit.expects = parse_expects(annotation, value)?,
                Slot::MissingOk => explicit.missing_ok = parse_missing_ok(annotation, value)?,
            }
        }

        let effective = explicit.inherit(defaults);
        let resolved = MatchAnnotation {
            matcher,
            policy: CardinalityPolicy {
                expects: effective.expects.unwrap_or_default(),
                missing_ok: effective.missing_ok.unwrap_or(false),
            },
        };
        debug!(
            annotation = %annotation.name,
            matcher = %resolved.matcher,
            expects = ?resolved.policy.expects,
            missing_ok = resolved.policy.missing_ok,
            "Resolved match annotation"
        );
        Ok(resolved)
    }
}
