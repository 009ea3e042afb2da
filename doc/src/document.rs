//! YAML documents in the matcher's node model.
//!
//! [`Document`] parses YAML with `serde_yaml` and converts it into
//! [`Node`]s. Every mapping entry gets a [`Position`] naming the source label
//! and the dotted path of the entry. `serde_yaml` does not expose line
//! spans, so positions carry no line numbers.
//!
//! # Example
//!
//! ```
//! use overlay_match_doc::Document;
//!
//! let doc = Document::parse("base.yml", "services:\n  web: {port: 80}\n  db: {port: 5432}\n").unwrap();
//! let services = doc.collection_at("services").unwrap();
//! assert_eq!(services.len(), 2);
//! assert_eq!(services[1].position.to_string(), "base.yml:services.db");
//! ```

use std::path::Path;

use overlay_match_core::{Entry, Node, Position};
use serde_yaml::{Number, Value};
use sha2::{Digest, Sha256};

use crate::error::{DocumentError, Result};

/// A parsed base document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source label used in positions (usually the file path).
    pub label: String,
    pub root: Node,
    /// SHA-256 hex digest of the source text.
    pub checksum: String,
}

impl Document {
    /// Reads and parses a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DocumentError::IoError) if the file cannot be
    /// read, or [`YamlError`](DocumentError::YamlError) if it is not YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::parse(path.display().to_string(), &text)
    }

    /// Parses YAML text, labelling positions with `label`.
    pub fn parse(label: impl Into<String>, text: &str) -> Result<Self> {
        let label = label.into();
        let value: Value = serde_yaml::from_str(text)?;
        let root = to_node(&value, &label, "")?;
        let checksum = format!("{:x}", Sha256::digest(text.as_bytes()));
        Ok(Self {
            label,
            root,
            checksum,
        })
    }

    /// Returns the entries of the mapping at a dotted `path`.
    ///
    /// Segments name mapping keys; `[n]` suffixes or purely numeric segments
    /// index sequences. An empty path selects the root.
    ///
    /// # Errors
    ///
    /// [`PathNotFound`](DocumentError::PathNotFound) when a segment is
    /// missing, [`NotAMapping`](DocumentError::NotAMapping) when the target
    /// is not a mapping.
    pub fn collection_at(&self, path: &str) -> Result<&[Entry]> {
        let mut node = &self.root;
        let mut walked = String::new();

        for step in parse_path(path)? {
            walked = join_path(&walked, &step);
            node = match (&step, node) {
                (Step::Index(i), Node::Sequence(items)) => items.get(*i),
                (Step::Key(key), Node::Sequence(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (Step::Key(key), _) => node.get(key),
                (Step::Index(_), _) => None,
            }
            .ok_or_else(|| DocumentError::PathNotFound(walked.clone()))?;
        }

        node.as_mapping().ok_or_else(|| DocumentError::NotAMapping {
            path: if walked.is_empty() {
                "<root>".to_string()
            } else {
                walked
            },
            found: node.type_name(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    let path = path.trim();
    if path.is_empty() {
        return Ok(steps);
    }

    for segment in path.split('.') {
        let (name, mut rest) = match segment.find('[') {
            Some(at) => segment.split_at(at),
            None => (segment, ""),
        };
        if !name.is_empty() {
            steps.push(Step::Key(name.to_string()));
        }
        while !rest.is_empty() {
            let close = rest
                .find(']')
                .ok_or_else(|| DocumentError::PathNotFound(path.to_string()))?;
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| DocumentError::PathNotFound(path.to_string()))?;
            steps.push(Step::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(DocumentError::PathNotFound(path.to_string()));
            }
        }
        if name.is_empty() && !segment.starts_with('[') {
            return Err(DocumentError::PathNotFound(path.to_string()));
        }
    }
    Ok(steps)
}

fn join_path(base: &str, step: &Step) -> String {
    match step {
        Step::Index(i) => format!("{base}[{i}]"),
        Step::Key(key) if base.is_empty() => key.clone(),
        Step::Key(key) => format!("{base}.{key}"),
    }
}

fn key_label(key: &Node) -> String {
    match key {
        Node::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Converts a YAML value, recording entry positions under `path`.
///
/// # Errors
///
/// Returns [`IntegerOutOfRange`](DocumentError::IntegerOutOfRange) for
/// integers above `i64::MAX`.
pub fn to_node(value: &Value, label: &str, path: &str) -> Result<Node> {
    let node = match value {
        Value::Null => Node::Null,
        Value::Bool(b) => Node::Bool(*b),
        Value::Number(n) => number_to_node(n, path)?,
        Value::String(s) => Node::String(s.clone()),
        Value::Sequence(items) => Node::Sequence(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_node(item, label, &join_path(path, &Step::Index(i))))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(mapping) => Node::Mapping(
            mapping
                .iter()
                .map(|(key, value)| {
                    let key = to_node(key, label, path)?;
                    let entry_path = join_path(path, &Step::Key(key_label(&key)));
                    let value = to_node(value, label, &entry_path)?;
                    Ok(Entry::new(key, value)
                        .with_position(Position::new(label).with_path(entry_path)))
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Tagged(tagged) => to_node(&tagged.value, label, path)?,
    };
    Ok(node)
}

fn number_to_node(n: &Number, path: &str) -> Result<Node> {
    if let Some(i) = n.as_i64() {
        return Ok(Node::Int(i));
    }
    if let Some(value) = n.as_u64() {
        return Err(DocumentError::IntegerOutOfRange {
            path: if path.is_empty() {
                "<root>".to_string()
            } else {
                path.to_string()
            },
            value,
        });
    }
    Ok(Node::Float(n.as_f64().unwrap_or(f64::NAN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
services:
  web:
    name: web
    port: 80
  db:
    name: db
    port: 5432
items:
  - name: first
  - name: second
    tags: {env: prod}
count: 3
ratio: 0.5
"#;

    #[test]
    fn test_parse_converts_scalars() {
        let doc = Document::parse("base.yml", BASE).unwrap();
        assert_eq!(doc.root.get("count"), Some(&Node::Int(3)));
        assert_eq!(doc.root.get("ratio"), Some(&Node::Float(0.5)));
    }

    #[test]
    fn test_parse_rejects_integers_beyond_i64() {
        let err = Document::parse("base.yml", "limits:\n  max: 18446744073709551615\n").unwrap_err();
        assert!(matches!(
            &err,
            DocumentError::IntegerOutOfRange { path, value: u64::MAX } if path == "limits.max"
        ));
        assert_eq!(
            err.to_string(),
            "integer 18446744073709551615 at 'limits.max' is out of range"
        );

        let doc = Document::parse("base.yml", "big: 9223372036854775807\n").unwrap();
        assert_eq!(doc.root.get("big"), Some(&Node::Int(i64::MAX)));
    }

    #[test]
    fn test_collection_at_root_and_nested() {
        let doc = Document::parse("base.yml", BASE).unwrap();
        assert_eq!(doc.collection_at("").unwrap().len(), 4);
        let services = doc.collection_at("services").unwrap();
        assert_eq!(services[0].key, Node::from("web"));
        assert_eq!(
            services[0].position,
            Position::new("base.yml").with_path("services.web")
        );
    }

    #[test]
    fn test_collection_at_sequence_index() {
        let doc = Document::parse("base.yml", BASE).unwrap();
        let second = doc.collection_at("items[1]").unwrap();
        assert_eq!(second[0].value, Node::from("second"));
        assert_eq!(
            second[0].position.path.as_deref(),
            Some("items[1].name")
        );
        let tags = doc.collection_at("items.1.tags").unwrap();
        assert_eq!(tags[0].key, Node::from("env"));
    }

    #[test]
    fn test_collection_at_errors() {
        let doc = Document::parse("base.yml", BASE).unwrap();
        assert!(matches!(
            doc.collection_at("services.cache"),
            Err(DocumentError::PathNotFound(path)) if path == "services.cache"
        ));
        assert!(matches!(
            doc.collection_at("count"),
            Err(DocumentError::NotAMapping { found: "int", .. })
        ));
        assert!(matches!(
            doc.collection_at("items"),
            Err(DocumentError::NotAMapping { found: "sequence", .. })
        ));
        assert!(doc.collection_at("items[x]").is_err());
    }

    #[test]
    fn test_empty_document_has_no_root_mapping() {
        let doc = Document::parse("empty.yml", "").unwrap();
        assert!(matches!(
            doc.collection_at(""),
            Err(DocumentError::NotAMapping { ref path, found: "null" }) if path == "<root>"
        ));
    }

    #[test]
    fn test_checksum_tracks_content() {
        let a = Document::parse("a.yml", "x: 1\n").unwrap();
        let b = Document::parse("b.yml", "x: 1\n").unwrap();
        let c = Document::parse("c.yml", "x: 2\n").unwrap();
        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
        assert_eq!(a.checksum.len(), 64);
    }

    #[test]
    fn test_tagged_values_are_unwrapped() {
        let doc = Document::parse("t.yml", "a: !custom 5\n").unwrap();
        assert_eq!(doc.root.get("a"), Some(&Node::Int(5)));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(matches!(
            Document::parse("bad.yml", "a: [1, 2"),
            Err(DocumentError::YamlError(_))
        ));
    }
}
