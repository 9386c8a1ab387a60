//! AST module for symwalk code trees
//!
//! This module provides the code model every pass consumes and produces:
//! symbols, literal atoms, call-shaped expressions, and literal sequences.
//! Nodes are plain immutable values; every rewrite builds a new tree.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Operator that heads attribute-access forms: `(. obj attr ...)`.
pub const DOT: &str = ".";

/// The kind of a literal collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeqKind {
    /// `[a b]`
    List,
    /// `#(a b)`
    Tuple,
    /// `#{a b}`
    Set,
    /// `{k v}`
    Dict,
}

/// A non-structural literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    /// `:name`, stored without the colon.
    Keyword(String),
}

/// The canonical code node.
///
/// # Examples
///
/// ```rust
/// use symwalk::ast::Node;
/// let call = Node::expr(vec![Node::sym("print"), Node::int(1)]);
/// assert_eq!(call.head_symbol(), Some("print"));
/// assert_eq!(call.to_string(), "(print 1)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Node {
    Symbol(String),
    Expression(Vec<Node>),
    Sequence(SeqKind, Vec<Node>),
    Atom(Literal),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Node {
    // ------------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------------

    pub fn sym(name: impl Into<String>) -> Self {
        Node::Symbol(name.into())
    }

    pub fn expr(items: Vec<Node>) -> Self {
        Node::Expression(items)
    }

    pub fn list(items: Vec<Node>) -> Self {
        Node::Sequence(SeqKind::List, items)
    }

    pub fn tuple(items: Vec<Node>) -> Self {
        Node::Sequence(SeqKind::Tuple, items)
    }

    pub fn dict(items: Vec<Node>) -> Self {
        Node::Sequence(SeqKind::Dict, items)
    }

    pub fn int(value: i64) -> Self {
        Node::Atom(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Atom(Literal::String(value.into()))
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Node::Atom(Literal::Keyword(name.into()))
    }

    /// Builds `(head args...)` from a head symbol name.
    pub fn call(head: &str, args: impl IntoIterator<Item = Node>) -> Self {
        let mut items = vec![Node::sym(head)];
        items.extend(args);
        Node::Expression(items)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Returns the symbol name if this node is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Node::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the elements if this node is an expression.
    pub fn as_expression(&self) -> Option<&[Node]> {
        match self {
            Node::Expression(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the elements of a sequence literal of the given kind.
    pub fn as_sequence(&self, kind: SeqKind) -> Option<&[Node]> {
        match self {
            Node::Sequence(k, items) if *k == kind => Some(items),
            _ => None,
        }
    }

    /// Returns the keyword name (without the colon) if this node is a keyword.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Node::Atom(Literal::Keyword(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns the head symbol of a non-empty expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use symwalk::ast::Node;
    /// assert_eq!(Node::expr(vec![]).head_symbol(), None);
    /// assert_eq!(Node::call("quote", [Node::sym("x")]).head_symbol(), Some("quote"));
    /// ```
    pub fn head_symbol(&self) -> Option<&str> {
        match self {
            Node::Expression(items) => items.first().and_then(Node::as_symbol),
            _ => None,
        }
    }

    /// Returns the node type as a string, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Symbol(_) => "symbol",
            Node::Expression(_) => "expression",
            Node::Sequence(SeqKind::List, _) => "list",
            Node::Sequence(SeqKind::Tuple, _) => "tuple",
            Node::Sequence(SeqKind::Set, _) => "set",
            Node::Sequence(SeqKind::Dict, _) => "dict",
            Node::Atom(Literal::Integer(_)) => "integer",
            Node::Atom(Literal::Float(_)) => "float",
            Node::Atom(Literal::String(_)) => "string",
            Node::Atom(Literal::Keyword(_)) => "keyword",
        }
    }

    /// Rebuilds a collection with new elements, keeping its kind.
    ///
    /// Atoms and symbols are returned unchanged.
    pub fn with_elements(&self, items: Vec<Node>) -> Node {
        match self {
            Node::Expression(_) => Node::Expression(items),
            Node::Sequence(kind, _) => Node::Sequence(*kind, items),
            other => other.clone(),
        }
    }

    /// Returns the elements of an expression or sequence.
    pub fn elements(&self) -> Option<&[Node]> {
        match self {
            Node::Expression(items) | Node::Sequence(_, items) => Some(items),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Dotted names
// ----------------------------------------------------------------------------

/// Splits `a.b.c` into its segments.
///
/// Returns `None` for names that are not attribute paths: names starting with
/// the separator (`.method`, `...`), names without one, and names with an
/// empty segment.
///
/// # Examples
///
/// ```rust
/// use symwalk::ast::dotted_segments;
/// assert_eq!(dotted_segments("a.b"), Some(vec!["a", "b"]));
/// assert_eq!(dotted_segments(".append"), None);
/// assert_eq!(dotted_segments("a..b"), None);
/// ```
pub fn dotted_segments(name: &str) -> Option<Vec<&str>> {
    if name.starts_with('.') || !name.contains('.') {
        return None;
    }
    let segments: Vec<&str> = name.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// True if the name is an attribute path such as `a.b`.
pub fn is_dotted(name: &str) -> bool {
    dotted_segments(name).is_some()
}

/// Rewrites a dotted symbol into its canonical `(. a b ...)` form.
pub fn canonical_dot_form(name: &str) -> Option<Node> {
    let segments = dotted_segments(name)?;
    Some(Node::call(DOT, segments.into_iter().map(Node::sym)))
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Node::Atom(literal)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            // `{:?}` keeps the fractional part on whole floats (`1.0`).
            Literal::Float(n) => write!(f, "{:?}", n),
            Literal::String(s) => write_escaped(f, s),
            Literal::Keyword(k) => write!(f, ":{}", k),
        }
    }
}

/// Prints the canonical long form; reading it back gives an equal tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Symbol(name) => f.write_str(name),
            Node::Atom(literal) => write!(f, "{}", literal),
            Node::Expression(items) => write_delimited(f, "(", items, ")"),
            Node::Sequence(SeqKind::List, items) => write_delimited(f, "[", items, "]"),
            Node::Sequence(SeqKind::Tuple, items) => write_delimited(f, "#(", items, ")"),
            Node::Sequence(SeqKind::Set, items) => write_delimited(f, "#{", items, "}"),
            Node::Sequence(SeqKind::Dict, items) => write_delimited(f, "{", items, "}"),
        }
    }
}

// ============================================================================
// PRINTING HELPERS (INTERNAL)
// ============================================================================

fn write_delimited(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: &[Node],
    close: &str,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod walk;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_every_node_kind() {
        let node = Node::expr(vec![
            Node::sym("f"),
            Node::list(vec![Node::int(1), Node::Atom(Literal::Float(2.0))]),
            Node::tuple(vec![]),
            Node::Sequence(SeqKind::Set, vec![Node::keyword("k")]),
            Node::dict(vec![Node::string("a\"b"), Node::int(-3)]),
        ]);
        assert_eq!(node.to_string(), r#"(f [1 2.0] #() #{:k} {"a\"b" -3})"#);
    }

    #[test]
    fn canonical_dot_form_splits_segments() {
        let form = canonical_dot_form("obj.attr.inner").unwrap();
        assert_eq!(form.to_string(), "(. obj attr inner)");
        assert!(canonical_dot_form("...").is_none());
        assert!(canonical_dot_form("plain").is_none());
        assert!(canonical_dot_form("trailing.").is_none());
    }

    #[test]
    fn with_elements_keeps_kind() {
        let set = Node::Sequence(SeqKind::Set, vec![Node::int(1)]);
        let rebuilt = set.with_elements(vec![Node::int(2)]);
        assert_eq!(rebuilt, Node::Sequence(SeqKind::Set, vec![Node::int(2)]));
        assert_eq!(Node::sym("x").with_elements(vec![]), Node::sym("x"));
    }
}
