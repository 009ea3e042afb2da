//! Runs a match request against a base document.
//!
//! Each entry is matched independently; a failing entry is recorded in the
//! report and the remaining entries still run. Whether a single failure
//! aborts the overlay is left to the caller.

use overlay_match_core::{MatchAnnotation, MatchContext, MatchError, Node};
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::Result;
use crate::report::{EntryOutcome, ErrorReport, MatchReport, REPORT_VERSION};
use crate::request::MatchRequest;

/// Label used in positions of request entries.
pub const REQUEST_LABEL: &str = "request";

/// Options for [`run_request`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the request's `target` path.
    pub target: Option<String>,
}

/// Matches every request entry against the target mapping of `document`.
///
/// # Errors
///
/// Fails only on request-level problems: invalid defaults, malformed
/// entry options or values, or a target path that does not name a mapping.
/// Per-entry match failures land in the report.
///
/// # Examples
///
/// ```
/// use overlay_match_core::{Comparators, FunctionTable, MatchContext};
/// use overlay_match_doc::{Document, MatchRequest, RunOptions, run_request};
///
/// let doc = Document::parse("base.yml", "web: 1\ndb: 2\n").unwrap();
/// let request: MatchRequest = serde_yaml::from_str(r#"
/// version: "1.0"
/// entries:
///   - key: db
///   - key: cache
/// "#).unwrap();
///
/// let evaluator = FunctionTable::new();
/// let comparators = Comparators::new();
/// let ctx = MatchContext::new(&evaluator, &comparators);
///
/// let report = run_request(&doc, &request, &ctx, &RunOptions::default()).unwrap();
/// assert_eq!(report.outcomes[0].indices, vec![1]);
/// assert_eq!(report.failure_count(), 1);
/// ```
pub fn run_request(
    document: &Document,
    request: &MatchRequest,
    ctx: &MatchContext<'_>,
    options: &RunOptions,
) -> Result<MatchReport> {
    let defaults = request.match_defaults()?;
    let target = options.target.clone().or_else(|| request.target.clone());
    let collection = document.collection_at(target.as_deref().unwrap_or(""))?;
    debug!(
        base = %document.label,
        target = ?target,
        candidates = collection.len(),
        entries = request.entries.len(),
        "Running match request"
    );

    let mut outcomes = Vec::with_capacity(request.entries.len());
    for (index, request_entry) in request.entries.iter().enumerate() {
        let new_entry = request_entry.to_entry(REQUEST_LABEL, index)?;
        let key = render_key(&new_entry.key);

        let annotation = request_entry.annotation()?;
        let matched = MatchAnnotation::resolve(&annotation, &defaults)
            .map_err(MatchError::from)
            .and_then(|resolved| resolved.match_nodes(collection, &new_entry, ctx));

        let outcome = match matched {
            Ok(result) => EntryOutcome {
                key,
                indices: result.indices,
                positions: result.positions,
                error: None,
            },
            Err(err) => {
                warn!(key = %key, kind = err.kind(), error = %err, "Entry did not match");
                EntryOutcome {
                    key,
                    indices: Vec::new(),
                    positions: Vec::new(),
                    error: Some(ErrorReport::from(&err)),
                }
            }
        };
        outcomes.push(outcome);
    }

    let report = MatchReport {
        version: REPORT_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        base: document.label.clone(),
        base_checksum: document.checksum.clone(),
        target,
        outcomes,
    };
    info!(
        entries = report.outcomes.len(),
        failures = report.failure_count(),
        "Match request finished"
    );
    Ok(report)
}

fn render_key(key: &Node) -> String {
    match key {
        Node::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use overlay_match_core::{Comparators, FunctionTable};

    use super::*;
    use crate::error::DocumentError;

    const BASE: &str = r#"
services:
  web: {name: web, port: 80}
  api: {name: web, port: 81}
  db: {name: db, port: 5432}
"#;

    fn run(request_yaml: &str) -> Result<MatchReport> {
        let doc = Document::parse("base.yml", BASE)?;
        let request: MatchRequest = serde_yaml::from_str(request_yaml)?;
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new().with_map_key_fallback();
        let ctx = MatchContext::new(&evaluator, &comparators);
        run_request(&doc, &request, &ctx, &RunOptions::default())
    }

    #[test]
    fn test_entries_are_independent() {
        let report = run(r#"
version: "1.0"
target: services
entries:
  - key: frontend
    value: {name: web}
    match: {by: name}
  - key: db
  - key: x
    value: {name: web}
    match: {by: name, expects: 2}
"#)
        .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        let ambiguous = report.outcomes[0].error.as_ref().unwrap();
        assert_eq!(ambiguous.kind, "cardinality");
        assert_eq!(
            ambiguous.message,
            "expected exactly one match, found 2 (matched at base.yml:services.web, base.yml:services.api)"
        );
        assert_eq!(report.outcomes[1].indices, vec![2]);
        assert_eq!(report.outcomes[2].indices, vec![0, 1]);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.target.as_deref(), Some("services"));
    }

    #[test]
    fn test_configuration_errors_are_recorded() {
        let report = run(r#"
version: "1.0"
target: services
entries:
  - key: web
    match: {byKey: name}
"#)
        .unwrap();
        let error = report.outcomes[0].error.as_ref().unwrap();
        assert_eq!(error.kind, "configuration");
        assert!(error.message.contains("'byKey'"));
    }

    #[test]
    fn test_defaults_apply_to_entries() {
        let report = run(r#"
version: "1.0"
target: services
defaults: {missing_ok: true}
entries:
  - key: cache
"#)
        .unwrap();
        assert!(report.is_success());
        assert!(report.outcomes[0].indices.is_empty());
    }

    #[test]
    fn test_out_of_range_entry_value_fails_request() {
        let err = run(r#"
version: "1.0"
target: services
entries:
  - key: web
    value: {port: 18446744073709551615}
"#)
        .unwrap_err();
        assert!(matches!(
            err,
            DocumentError::IntegerOutOfRange { ref path, .. } if path == "entries[0].port"
        ));
    }

    #[test]
    fn test_bad_target_fails_request() {
        let err = run(r#"
version: "1.0"
target: services.web.port
entries: []
"#)
        .unwrap_err();
        assert!(matches!(err, DocumentError::NotAMapping { found: "int", .. }));
    }

    #[test]
    fn test_option_target_overrides_request() {
        let doc = Document::parse("base.yml", BASE).unwrap();
        let request: MatchRequest = serde_yaml::from_str(
            r#"
version: "1.0"
target: nowhere
entries:
  - key: port
"#,
        )
        .unwrap();
        let evaluator = FunctionTable::new();
        let comparators = Comparators::new();
        let ctx = MatchContext::new(&evaluator, &comparators);
        let options = RunOptions {
            target: Some("services.db".to_string()),
        };
        let report = run_request(&doc, &request, &ctx, &options).unwrap();
        assert_eq!(report.outcomes[0].indices, vec![1]);
        assert_eq!(report.base_checksum, doc.checksum);
    }
}
