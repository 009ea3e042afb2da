//! Error types for document and request handling.
//!
//! Matching failures themselves are not errors at this level: the runner
//! records them per entry in the report. These errors cover reading and
//! interpreting the input files.

use thiserror::Error;

use overlay_match_core::ConfigurationError;

/// Errors that can occur while loading documents or match requests.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A document path segment does not exist.
    #[error("path not found in document: {0}")]
    PathNotFound(String),

    /// The node at a document path is not a mapping.
    #[error("expected mapping at '{path}', but was {found}")]
    NotAMapping { path: String, found: &'static str },

    /// A YAML integer does not fit the node model's signed 64-bit range.
    #[error("integer {value} at '{path}' is out of range")]
    IntegerOutOfRange { path: String, value: u64 },

    /// The match request is structurally invalid.
    #[error("invalid match request: {0}")]
    InvalidRequest(String),

    /// Request-level defaults failed to resolve.
    #[error("invalid match defaults: {0}")]
    InvalidDefaults(#[from] ConfigurationError),
}

/// Convenience alias for results with [`DocumentError`].
pub type Result<T> = std::result::Result<T, DocumentError>;
