//! Predicate functions available to `!fn` matchers on the command line.
//!
//! Every builtin takes the matcher's three arguments: candidate key,
//! candidate value, new value.

use overlay_match_core::{FunctionTable, Node, Truthiness, deep_equal};

/// Arity shared by all matcher predicates.
const MATCHER_ARITY: usize = 3;

/// Builds the function table used by `overlay-match match`.
pub fn builtin_functions(truthiness: Truthiness) -> FunctionTable {
    let mut table = FunctionTable::new().with_truthiness(truthiness);
    table.register("same_value", MATCHER_ARITY, |args| {
        Ok(Node::Bool(deep_equal(&args[1], &args[2])))
    });
    table.register("subset", MATCHER_ARITY, |args| {
        Ok(Node::Bool(is_subset(&args[2], &args[1])))
    });
    table.register("always", MATCHER_ARITY, |_| Ok(Node::Bool(true)));
    table.register("never", MATCHER_ARITY, |_| Ok(Node::Bool(false)));
    table
}

/// `true` when every entry of mapping `part` appears, equal, in `whole`.
fn is_subset(part: &Node, whole: &Node) -> bool {
    match (part, whole) {
        (Node::Mapping(part), Node::Mapping(whole)) => part.iter().all(|wanted| {
            whole.iter().any(|entry| {
                deep_equal(&entry.key, &wanted.key) && deep_equal(&entry.value, &wanted.value)
            })
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use overlay_match_core::{Callable, Entry, Evaluator};

    use super::*;

    fn call(table: &FunctionTable, name: &str, value: Node, new_value: Node) -> Node {
        table
            .invoke(&Callable::new(name), &[Node::from("k"), value, new_value])
            .unwrap()
    }

    #[test]
    fn test_same_value() {
        let table = builtin_functions(Truthiness::Loose);
        assert_eq!(
            call(&table, "same_value", Node::Int(1), Node::Int(1)),
            Node::Bool(true)
        );
        assert_eq!(
            call(&table, "same_value", Node::Int(1), Node::from("1")),
            Node::Bool(false)
        );
    }

    #[test]
    fn test_subset() {
        let table = builtin_functions(Truthiness::Loose);
        let whole = Node::Mapping(vec![Entry::new("name", "web"), Entry::new("port", 80)]);
        let part = Node::Mapping(vec![Entry::new("name", "web")]);
        assert_eq!(
            call(&table, "subset", whole.clone(), part.clone()),
            Node::Bool(true)
        );
        assert_eq!(call(&table, "subset", part, whole), Node::Bool(false));
        assert_eq!(
            call(&table, "subset", Node::Int(1), Node::Mapping(vec![])),
            Node::Bool(false)
        );
    }

    #[test]
    fn test_registered_names() {
        let table = builtin_functions(Truthiness::Strict);
        assert_eq!(table.names(), vec!["always", "never", "same_value", "subset"]);
    }
}
