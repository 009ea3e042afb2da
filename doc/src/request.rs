//! Match request files.
//!
//! A request lists the new entries to match against a base document,
//! together with the `overlay/match` keyword options of each entry and the
//! defaults that apply to all of them.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! target: services
//! defaults:
//!   expects: 1
//!   missing_ok: false
//! entries:
//!   - key: web
//!     value: { name: web }
//!     match:
//!       by: name
//!       expects: "1+"
//!   - key: cache
//!     match:
//!       by: !fn same_value
//!       missing_ok: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use overlay_match_core::{
    ANNOTATION_MATCH, ANNOTATION_MATCH_CHILD_DEFAULTS, Annotation, ArgValue, Callable, Entry,
    MatchDefaults, Position,
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::document::to_node;
use crate::error::{DocumentError, Result};

/// YAML tag marking a keyword value as a callable reference.
pub const CALLABLE_TAG: &str = "fn";

/// One new entry to match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEntry {
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    /// Keyword options of the `overlay/match` annotation.
    #[serde(default, rename = "match")]
    pub options: Mapping,
}

impl RequestEntry {
    /// Converts the entry into the matcher's node model.
    pub fn to_entry(&self, label: &str, index: usize) -> Result<Entry> {
        let path = format!("entries[{index}]");
        Ok(Entry::new(
            to_node(&self.key, label, &path)?,
            to_node(&self.value, label, &path)?,
        )
        .with_position(Position::new(label).with_path(path)))
    }

    /// Builds the `overlay/match` annotation from the entry's options.
    pub fn annotation(&self) -> Result<Annotation> {
        annotation_from(ANNOTATION_MATCH, &self.options)
    }
}

/// Top-level match request.
///
/// # Examples
///
/// ```
/// use overlay_match_doc::MatchRequest;
///
/// let request: MatchRequest = serde_yaml::from_str(r#"
/// version: "1.0"
/// entries:
///   - key: web
///     match: { expects: "0+" }
/// "#).unwrap();
/// assert_eq!(request.entries.len(), 1);
/// assert!(request.target.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Request format version (e.g., `"1.0"`).
    pub version: String,
    /// Dotted path of the base mapping to match against (root when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Keyword options of the `overlay/match_child_defaults` annotation.
    #[serde(default)]
    pub defaults: Mapping,
    #[serde(default)]
    pub entries: Vec<RequestEntry>,
}

impl MatchRequest {
    /// Loads a request from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DocumentError::IoError) if the file cannot be
    /// read, or [`YamlError`](DocumentError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let request = serde_yaml::from_reader(reader)?;
        Ok(request)
    }

    /// Saves the request as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Resolves the request-level defaults.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequest`](DocumentError::InvalidRequest) for
    /// malformed option values and
    /// [`InvalidDefaults`](DocumentError::InvalidDefaults) when the options
    /// are rejected by the defaults annotation.
    pub fn match_defaults(&self) -> Result<MatchDefaults> {
        let annotation = annotation_from(ANNOTATION_MATCH_CHILD_DEFAULTS, &self.defaults)?;
        Ok(MatchDefaults::from_annotation(&annotation)?)
    }
}

fn annotation_from(name: &str, options: &Mapping) -> Result<Annotation> {
    let mut annotation = Annotation::new(name);
    for (keyword, value) in options {
        let keyword = keyword.as_str().ok_or_else(|| {
            DocumentError::InvalidRequest(format!(
                "'{name}' keyword names must be strings, found {keyword:?}"
            ))
        })?;
        annotation = annotation.with_kwarg(keyword, to_arg(value)?);
    }
    Ok(annotation)
}

/// Converts a YAML option value into an annotation argument.
///
/// `!fn name` becomes a [`Callable`]; mappings and other tags are rejected.
pub fn to_arg(value: &Value) -> Result<ArgValue> {
    match value {
        Value::Null => Ok(ArgValue::None),
        Value::Bool(b) => Ok(ArgValue::Bool(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Ok(ArgValue::Int(i)),
            (None, Some(u)) => Err(DocumentError::InvalidRequest(format!(
                "integer option value {u} is out of range"
            ))),
            (None, None) => Ok(ArgValue::Float(n.as_f64().unwrap_or(f64::NAN))),
        },
        Value::String(s) => Ok(ArgValue::String(s.clone())),
        Value::Sequence(items) => Ok(ArgValue::List(
            items.iter().map(to_arg).collect::<Result<Vec<_>>>()?,
        )),
        Value::Tagged(tagged) if tagged.tag == CALLABLE_TAG => match &tagged.value {
            Value::String(name) => Ok(ArgValue::Callable(Callable::new(name.clone()))),
            other => Err(DocumentError::InvalidRequest(format!(
                "!{CALLABLE_TAG} expects a function name, found {other:?}"
            ))),
        },
        Value::Tagged(tagged) => Err(DocumentError::InvalidRequest(format!(
            "unsupported tag {} on option value",
            tagged.tag
        ))),
        Value::Mapping(_) => Err(DocumentError::InvalidRequest(
            "option values cannot be mappings".to_string(),
        )),
    }
}
