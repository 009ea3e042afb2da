//! Predicate evaluation boundary.
//!
//! The matcher never runs scripts itself. It hands a [`Callable`] and its
//! arguments to an [`Evaluator`] and asks the same evaluator to coerce the
//! result to a bool. [`FunctionTable`] is an in-process evaluator backed by
//! plain Rust closures.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Node, ScriptError};

/// Opaque reference to a function known to an [`Evaluator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Callable {
    pub name: String,
}

impl Callable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Executes callables on behalf of the predicate matcher.
pub trait Evaluator {
    /// Calls `callable` with positional `args`.
    fn invoke(&self, callable: &Callable, args: &[Node]) -> Result<Node, ScriptError>;

    /// Coerces a call result to a bool using the evaluator's own rules.
    fn to_bool(&self, value: &Node) -> Result<bool, ScriptError>;
}

/// How [`FunctionTable`] coerces results to bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truthiness {
    /// Any node coerces via [`Node::is_truthy`].
    #[default]
    Loose,
    /// Only bool results coerce; anything else is an error.
    Strict,
}

type Function = Box<dyn Fn(&[Node]) -> Result<Node, ScriptError>>;

struct Registered {
    arity: usize,
    function: Function,
}

/// Evaluator backed by named Rust closures.
///
/// # Examples
///
/// ```
/// use overlay_match_core::*;
///
/// let mut table = FunctionTable::new();
/// table.register("is_web", 3, |args| Ok(Node::Bool(args[0] == Node::from("web"))));
///
/// let result = table.invoke(&Callable::new("is_web"), &[Node::from("web"), Node::Null, Node::Null]);
/// assert_eq!(result, Ok(Node::Bool(true)));
///
/// // Wrong arity is reported by the evaluator, not the caller.
/// assert!(table.invoke(&Callable::new("is_web"), &[]).is_err());
/// ```
#[derive(Default)]
pub struct FunctionTable {
    functions: HashMap<String, Registered>,
    truthiness: Truthiness,
}

impl FunctionTable {
    /// Creates an empty table with loose truthiness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bool coercion mode.
    pub fn with_truthiness(mut self, truthiness: Truthiness) -> Self {
        self.truthiness = truthiness;
        self
    }

    /// Registers `function` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, arity: usize, function: F)
    where
        F: Fn(&[Node]) -> Result<Node, ScriptError> + 'static,
    {
        self.functions.insert(
            name.into(),
            Registered {
                arity,
                function: Box::new(function),
            },
        );
    }

    /// Returns `true` if a function named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .field("truthiness", &self.truthiness)
            .finish()
    }
}

impl Evaluator for FunctionTable {
    fn invoke(&self, callable: &Callable, args: &[Node]) -> Result<Node, ScriptError> {
        let registered = self
            .functions
            .get(&callable.name)
            .ok_or_else(|| ScriptError::new(format!("undefined function '{}'", callable.name)))?;
        if registered.arity != args.len() {
            return Err(ScriptError::new(format!(
                "function '{}' takes {} arguments ({} given)",
                callable.name,
                registered.arity,
                args.len()
            )));
        }
        (registered.function)(args)
    }

    fn to_bool(&self, value: &Node) -> Result<bool, ScriptError> {
        match (self.truthiness, value) {
            (_, Node::Bool(b)) => Ok(*b),
            (Truthiness::Loose, other) => Ok(other.is_truthy()),
            (Truthiness::Strict, other) => Err(ScriptError::new(format!(
                "expected bool, but was {}",
                other.type_name()
            ))),
        }
    }
}
