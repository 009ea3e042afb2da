//! Document node model used by the matcher.
//!
//! Documents are trees of [`Node`] values. Mapping nodes keep their entries
//! in source order as [`Entry`] values, each carrying a [`Position`] that is
//! only ever used for diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source location of an entry.
///
/// Every part is optional: a loader fills in what it knows. Positions take
/// no part in equality checks between nodes.
///
/// # Examples
///
/// ```
/// use overlay_match_core::Position;
///
/// let pos = Position::new("base.yml").with_line(12);
/// assert_eq!(pos.to_string(), "base.yml:12");
///
/// let pos = Position::new("base.yml").with_path("services.web");
/// assert_eq!(pos.to_string(), "base.yml:services.web");
///
/// assert_eq!(Position::unknown().to_string(), "?");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// File (or other source label) the entry came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 1-based line number, when the loader tracks lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Dotted document path of the entry (e.g. `services.web`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Position {
    /// Creates a position for `file` with no line or path.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
            path: None,
        }
    }

    /// Creates a position with nothing known.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Returns `true` when no file, line or path is known.
    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.line.is_none() && self.path.is_none()
    }

    /// Sets the line number.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the document path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_deref().unwrap_or("?");
        match (&self.file, self.line, &self.path) {
            (None, None, None) => write!(f, "?"),
            (_, Some(line), _) => write!(f, "{file}:{line}"),
            (_, None, Some(path)) => write!(f, "{file}:{path}"),
            (_, None, None) => write!(f, "{file}"),
        }
    }
}

/// A document node.
///
/// The set of shapes is closed, so equality is implemented structurally by
/// [`deep_equal`] rather than derived.
///
/// # Examples
///
/// ```
/// use overlay_match_core::{Entry, Node};
///
/// let svc = Node::Mapping(vec![
///     Entry::new("name", "web"),
///     Entry::new("port", 8080),
/// ]);
/// assert_eq!(svc.get("name"), Some(&Node::from("web")));
/// assert_eq!(svc.type_name(), "mapping");
/// assert!(svc.is_truthy());
/// ```
#[derive(Debug, Clone, Default)]
pub enum Node {
    /// `null` / `~`.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Node>),
    /// Ordered mapping entries.
    Mapping(Vec<Entry>),
}

impl Node {
    /// Short name of the node's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    /// Truthiness used by the in-process evaluator.
    ///
    /// Null, `false`, zero, and empty strings/sequences/mappings are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Node::Null => false,
            Node::Bool(b) => *b,
            Node::Int(i) => *i != 0,
            Node::Float(x) => *x != 0.0,
            Node::String(s) => !s.is_empty(),
            Node::Sequence(items) => !items.is_empty(),
            Node::Mapping(entries) => !entries.is_empty(),
        }
    }

    /// Looks up a string key in a mapping node.
    ///
    /// Returns `None` for non-mapping nodes and missing keys.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(entries) => entries
                .iter()
                .find(|entry| matches!(&entry.key, Node::String(k) if k == key))
                .map(|entry| &entry.value),
            _ => None,
        }
    }

    /// Returns the mapping entries, if this is a mapping.
    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match self {
            Node::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the string, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "null"),
            Node::Bool(b) => write!(f, "{b}"),
            Node::Int(i) => write!(f, "{i}"),
            Node::Float(x) => write!(f, "{x}"),
            Node::String(s) => write!(f, "{s:?}"),
            Node::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Node::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::Int(i64::from(i))
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<f64> for Node {
    fn from(x: f64) -> Self {
        Node::Float(x)
    }
}

impl From<Vec<Entry>> for Node {
    fn from(entries: Vec<Entry>) -> Self {
        Node::Mapping(entries)
    }
}

/// One key/value pair of a mapping node.
///
/// # Examples
///
/// ```
/// use overlay_match_core::{Entry, Node, Position};
///
/// let entry = Entry::new("replicas", 3).with_position(Position::new("base.yml").with_line(4));
/// assert_eq!(entry.key, Node::from("replicas"));
/// assert_eq!(entry.position.line, Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct Entry {
    pub key: Node,
    pub value: Node,
    /// Diagnostics only; ignored by equality.
    pub position: Position,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(&self.key, &other.key) && deep_equal(&self.value, &other.value)
    }
}

impl Entry {
    /// Creates an entry with an unknown position.
    pub fn new(key: impl Into<Node>, value: impl Into<Node>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            position: Position::unknown(),
        }
    }

    /// Sets the source position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// Structural equality over document nodes.
///
/// Scalars must share a variant and value (`1` and `1.0` differ). Sequences
/// compare element-wise in order. Mappings compare as unordered sets of
/// key/value pairs. Entry positions are ignored.
///
/// # Examples
///
/// ```
/// use overlay_match_core::{Entry, Node, deep_equal};
///
/// let a = Node::Mapping(vec![Entry::new("a", 1), Entry::new("b", 2)]);
/// let b = Node::Mapping(vec![Entry::new("b", 2), Entry::new("a", 1)]);
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&Node::Int(1), &Node::Float(1.0)));
/// ```
pub fn deep_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Null, Node::Null) => true,
        (Node::Bool(x), Node::Bool(y)) => x == y,
        (Node::Int(x), Node::Int(y)) => x == y,
        (Node::Float(x), Node::Float(y)) => x == y,
        (Node::String(x), Node::String(y)) => x == y,
        (Node::Sequence(xs), Node::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Node::Mapping(xs), Node::Mapping(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            // each entry of `ys` pairs with at most one entry of `xs`
            let mut used = vec![false; ys.len()];
            xs.iter().all(|x| {
                let pair = ys.iter().enumerate().position(|(i, y)| {
                    !used[i] && deep_equal(&x.key, &y.key) && deep_equal(&x.value, &y.value)
                });
                match pair {
                    Some(i) => {
                        used[i] = true;
                        true
                    }
                    None => false,
                }
            })
        }
        _ => false,
    }
}
