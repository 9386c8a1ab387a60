//! `match` clauses.
//!
//! `(match subject pattern [:as name] [:if guard] body ...)`. Symbols in a
//! pattern bind, except `_` and dotted names, which are values. The bound
//! names, plus the `:as` name, are protected in that clause's guard and body.

use crate::ast::{is_dotted, Node, DOT};
use crate::SymwalkError;

use super::{Protected, Substituter};

/// Heads whose operands are sub-patterns.
const PATTERN_OPERATORS: &[&str] = &["|", ",", "unpack-iterable", "unpack-mapping"];

pub(super) fn expand_match(
    sub: &Substituter<'_>,
    items: &[Node],
    region: &mut Protected,
) -> Result<Node, SymwalkError> {
    let mut out = vec![items[0].clone()];
    let Some(subject) = items.get(1) else {
        return Ok(Node::Expression(out));
    };
    out.push(sub.expand(subject, region, 0)?);

    let mut rest = &items[2..];
    while let Some((pattern, tail)) = rest.split_first() {
        let mut bound = Vec::new();
        out.push(sub.bind_pattern(pattern, region, &mut bound)?);
        rest = tail;

        if let [marker, name, tail @ ..] = rest {
            if marker.as_keyword() == Some("as") {
                out.push(marker.clone());
                out.push(name.clone());
                bound.extend(name.as_symbol().map(str::to_string));
                rest = tail;
            }
        }

        let mut clause = region.clone();
        clause.extend(bound);

        if let [marker, guard, tail @ ..] = rest {
            if marker.as_keyword() == Some("if") {
                out.push(marker.clone());
                out.push(sub.expand(guard, &mut clause, 0)?);
                rest = tail;
            }
        }
        if let Some((body, tail)) = rest.split_first() {
            out.push(sub.expand(body, &mut clause, 0)?);
            rest = tail;
        }
    }
    Ok(Node::Expression(out))
}

impl Substituter<'_> {
    /// Rewrites the value parts of a pattern and collects the names it binds.
    fn bind_pattern(
        &self,
        pattern: &Node,
        region: &mut Protected,
        bound: &mut Vec<String>,
    ) -> Result<Node, SymwalkError> {
        match pattern {
            Node::Symbol(name) if name == "_" => Ok(pattern.clone()),
            Node::Symbol(name) if is_dotted(name) => self.expand(pattern, region, 0),
            Node::Symbol(name) => {
                bound.push(name.clone());
                Ok(pattern.clone())
            }
            Node::Atom(_) => Ok(pattern.clone()),
            Node::Sequence(kind, parts) => Ok(Node::Sequence(
                *kind,
                self.bind_parts(parts, region, bound)?,
            )),
            Node::Expression(parts) => match parts.split_first() {
                None => Ok(pattern.clone()),
                Some((head, _)) if head.as_symbol() == Some(DOT) => self.expand(pattern, region, 0),
                Some((head, tail)) => {
                    let head = match head.as_symbol() {
                        Some(op) if PATTERN_OPERATORS.contains(&op) => head.clone(),
                        // class pattern: `(Point :x px)`
                        _ => self.expand(head, region, 0)?,
                    };
                    let mut out = vec![head];
                    out.extend(self.bind_parts(tail, region, bound)?);
                    Ok(Node::Expression(out))
                }
            },
        }
    }

    fn bind_parts(
        &self,
        parts: &[Node],
        region: &mut Protected,
        bound: &mut Vec<String>,
    ) -> Result<Vec<Node>, SymwalkError> {
        parts
            .iter()
            .map(|part| self.bind_pattern(part, region, bound))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Node;
    use crate::scope::{substitute, Protected};
    use crate::syntax::parse_one;

    fn sub(source: &str, names: &[&str]) -> String {
        let tree = parse_one(source).unwrap();
        let replace = |name: &str| {
            names
                .contains(&name)
                .then(|| Node::sym(format!("{}'", name)))
        };
        substitute(&tree, &replace, &Protected::new(), 0)
            .unwrap()
            .to_string()
    }

    #[test]
    fn pattern_symbols_bind_for_guard_and_body() {
        assert_eq!(
            sub("(match p [x y] :if (> x z) (f x y z) _ (f x))", &["p", "x", "y", "z", "f"]),
            "(match p' [x y] :if (> x z') (f' x y z') _ (f' x'))"
        );
    }

    #[test]
    fn dotted_and_class_heads_are_values() {
        assert_eq!(
            sub("(match v Color.RED 1 (Point :x px) px)", &["v", "Color", "Point", "px"]),
            "(match v' (. Color' RED) 1 (Point' :x px) px)"
        );
    }

    #[test]
    fn as_name_is_protected() {
        assert_eq!(
            sub("(match v (| 1 2) :as n (g n) n n)", &["v", "n", "g"]),
            "(match v' (| 1 2) :as n (g' n) n n)"
        );
    }

    #[test]
    fn bindings_do_not_leak_between_clauses() {
        assert_eq!(
            sub("(match v #(a #* rest) rest {\"k\" a} a _ (h a rest))", &["a", "rest", "h"]),
            "(match v #(a (unpack-iterable rest)) rest {\"k\" a} a _ (h' a' rest'))"
        );
    }
}
