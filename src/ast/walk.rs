//! Read-only traversal over code trees.

use crate::ast::Node;

/// Visits every symbol name in the tree, depth-first, left to right.
///
/// Quotation and binders are ignored; every symbol is reported.
pub fn for_each_symbol<F>(node: &Node, f: &mut F)
where
    F: FnMut(&str),
{
    match node {
        Node::Symbol(name) => f(name),
        Node::Expression(items) | Node::Sequence(_, items) => {
            for item in items {
                for_each_symbol(item, f);
            }
        }
        Node::Atom(_) => {}
    }
}
