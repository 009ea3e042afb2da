//! Match reports.
//!
//! A [`MatchReport`] records, per request entry, either the matched
//! indices and positions or the classified error, so a failed overlay can
//! be diagnosed without re-running it.

use overlay_match_core::{MatchError, Position};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Version of the report format.
pub const REPORT_VERSION: &str = "1.0";

/// Classified failure of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// `configuration`, `evaluation` or `cardinality`.
    pub kind: String,
    pub message: String,
}

impl From<&MatchError> for ErrorReport {
    fn from(err: &MatchError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result of matching one request entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryOutcome {
    /// Rendered key of the new entry.
    pub key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indices: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl EntryOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Output of a full request run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub version: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Label of the base document.
    pub base: String,
    /// SHA-256 of the base document source.
    pub base_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub outcomes: Vec<EntryOutcome>,
}

impl MatchReport {
    /// Number of entries that failed to match.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }

    /// Returns `true` when every entry matched acceptably.
    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// YAML rendering.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
