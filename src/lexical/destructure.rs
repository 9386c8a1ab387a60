//! Bind targets of `let`.
//!
//! A target is either a plain name or a destructuring pattern: a list, a
//! tuple, or a `,` form, nested freely, with `#*` allowed on any element.

use indexmap::IndexSet;

use crate::ast::{Node, SeqKind};
use crate::{err_msg, SymwalkError};

/// A validated `let` target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindTarget<'a> {
    Name(&'a str),
    Pattern(&'a Node),
}

/// Classifies a target, rejecting the shapes `let` cannot bind.
pub fn classify_target(target: &Node) -> Result<BindTarget<'_>, SymwalkError> {
    match target {
        Node::Symbol(name) => {
            check_not_dotted(name)?;
            Ok(BindTarget::Name(name))
        }
        Node::Atom(_) => Err(err_msg!(
            InvalidBindTarget,
            "cannot bind to {} {}",
            target.type_name(),
            target
        )
        .with_help("a let target is a name or a list/tuple pattern of names")),
        _ => {
            validate_pattern(target)?;
            Ok(BindTarget::Pattern(target))
        }
    }
}

// Any dot counts, including a leading or trailing one.
fn check_not_dotted(name: &str) -> Result<(), SymwalkError> {
    if name.contains('.') {
        return Err(err_msg!(IllegalDottedTarget, "cannot bind to dotted name '{}'", name)
            .with_help("bind a plain name and assign the attribute separately"));
    }
    Ok(())
}

fn validate_pattern(pattern: &Node) -> Result<(), SymwalkError> {
    match pattern {
        Node::Symbol(name) => check_not_dotted(name),
        Node::Atom(_) => Err(err_msg!(
            InvalidBindTarget,
            "cannot bind to {} {} inside a pattern",
            pattern.type_name(),
            pattern
        )),
        Node::Sequence(SeqKind::List | SeqKind::Tuple, items) => {
            items.iter().try_for_each(validate_pattern)
        }
        Node::Sequence(_, _) => Err(unsupported(pattern)),
        Node::Expression(items) => match items.split_first() {
            Some((head, tail)) if matches!(head.as_symbol(), Some("," | "unpack-iterable")) => {
                tail.iter().try_for_each(validate_pattern)
            }
            _ => Err(unsupported(pattern)),
        },
    }
}

fn unsupported(pattern: &Node) -> SymwalkError {
    err_msg!(
        UnsupportedDestructureShape,
        "cannot destructure into {} {}",
        pattern.type_name(),
        pattern
    )
    .with_help("only list, tuple, and `,` patterns can be destructured")
}

/// The distinct names a validated pattern binds, in order of appearance.
///
/// # Examples
///
/// ```rust
/// use symwalk::lexical::destructure::leaves;
/// use symwalk::syntax::parse_one;
/// let pattern = parse_one("[a #(b a) #* c]").unwrap();
/// assert_eq!(leaves(&pattern), vec!["a", "b", "c"]);
/// ```
pub fn leaves(pattern: &Node) -> Vec<&str> {
    let mut names = IndexSet::new();
    collect_leaves(pattern, &mut names);
    names.into_iter().collect()
}

fn collect_leaves<'a>(node: &'a Node, names: &mut IndexSet<&'a str>) {
    match node {
        Node::Symbol(name) => {
            names.insert(name);
        }
        Node::Sequence(_, items) => items.iter().for_each(|item| collect_leaves(item, names)),
        Node::Expression(items) => items
            .iter()
            .skip(1)
            .for_each(|item| collect_leaves(item, names)),
        Node::Atom(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_one;
    use crate::ErrorType;

    fn kind_of(source: &str) -> ErrorType {
        classify_target(&parse_one(source).unwrap())
            .unwrap_err()
            .error_type()
    }

    #[test]
    fn accepts_names_and_nested_patterns() {
        let name = parse_one("x").unwrap();
        assert_eq!(classify_target(&name).unwrap(), BindTarget::Name("x"));
        for source in ["[a [b c]]", "#(a #* rest)", "(, a (, b c))", "[a #* [b c]]"] {
            let node = parse_one(source).unwrap();
            assert!(matches!(classify_target(&node), Ok(BindTarget::Pattern(_))), "{}", source);
        }
    }

    #[test]
    fn rejects_each_shape_with_its_kind() {
        assert_eq!(kind_of("a.b"), ErrorType::IllegalDottedTarget);
        assert_eq!(kind_of("[x a.b]"), ErrorType::IllegalDottedTarget);
        assert_eq!(kind_of("a."), ErrorType::IllegalDottedTarget);
        assert_eq!(kind_of(".a"), ErrorType::IllegalDottedTarget);
        assert_eq!(kind_of("#(x .y)"), ErrorType::IllegalDottedTarget);
        assert_eq!(kind_of("{a 1}"), ErrorType::UnsupportedDestructureShape);
        assert_eq!(kind_of("#{a}"), ErrorType::UnsupportedDestructureShape);
        assert_eq!(kind_of("(f a)"), ErrorType::UnsupportedDestructureShape);
        assert_eq!(kind_of("(. obj attr)"), ErrorType::UnsupportedDestructureShape);
        assert_eq!(kind_of("[a (get d k)]"), ErrorType::UnsupportedDestructureShape);
        assert_eq!(kind_of("1"), ErrorType::InvalidBindTarget);
        assert_eq!(kind_of("[a \"s\"]"), ErrorType::InvalidBindTarget);
    }

    #[test]
    fn leaves_skip_pattern_operators() {
        let pattern = parse_one("(, a (unpack-iterable b))").unwrap();
        assert_eq!(leaves(&pattern), vec!["a", "b"]);
    }
}
