//! # Symbol substitution
//!
//! Rewrites free occurrences of symbols in a code tree. The traversal threads two
//! pieces of state:
//!
//! - **quotation depth**, passed by value: `quasiquote` raises it, `unquote` and
//!   `unquote-splice` lower it, and nothing is substituted while it is above zero;
//! - **the protected set** of the current region, passed as `&mut`: binders
//!   (`fn` parameters, `except` names, `match` targets) open a new region holding
//!   a copy of the enclosing set plus their names, while `global`/`nonlocal`
//!   add to the region they appear in, affecting every later form of that region.
//!
//! Dispatch on the head of an expression goes through [`forms::classify`]. The
//! order of checks is: quotation depth, then node kind, then the form table.
//!
//! ## Example
//!
//! ```rust
//! use symwalk::ast::Node;
//! use symwalk::scope::{substitute, Protected};
//! use symwalk::syntax::parse_one;
//!
//! let tree = parse_one("(do (fn [x] x) x)").unwrap();
//! let replace = |name: &str| (name == "x").then(|| Node::int(99));
//! let out = substitute(&tree, &replace, &Protected::new(), 0).unwrap();
//! assert_eq!(out.to_string(), "(do (fn [x] x) 99)");
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::{canonical_dot_form, Node};
use crate::{err_msg, SymwalkError};

pub mod forms;
pub mod params;
pub mod patterns;

use forms::FormKind;

/// Names that must not be substituted in the current region.
pub type Protected = im::HashSet<String>;

/// Source of replacement expressions for free symbols.
///
/// Returning `None` leaves the symbol as it is. A replacement is inserted
/// verbatim and is not substituted again.
pub trait Replacer {
    fn replace(&self, name: &str) -> Option<Node>;
}

impl<F> Replacer for F
where
    F: Fn(&str) -> Option<Node>,
{
    fn replace(&self, name: &str) -> Option<Node> {
        self(name)
    }
}

impl Replacer for IndexMap<String, Node> {
    fn replace(&self, name: &str) -> Option<Node> {
        self.get(name).cloned()
    }
}

impl Replacer for HashMap<String, Node> {
    fn replace(&self, name: &str) -> Option<Node> {
        self.get(name).cloned()
    }
}

/// Substitutes free symbols in `tree`.
///
/// `protected` names are treated as already bound; `quote_depth` is the
/// quotation depth `tree` sits at.
pub fn substitute(
    tree: &Node,
    replace: &dyn Replacer,
    protected: &Protected,
    quote_depth: usize,
) -> Result<Node, SymwalkError> {
    let mut region = protected.clone();
    Substituter { replace }.expand(tree, &mut region, quote_depth)
}

/// Substitutes a sequence of sibling forms sharing one region.
///
/// A `global` declaration in one form protects the name in the forms after it.
pub fn substitute_forms(
    forms: &[Node],
    replace: &dyn Replacer,
    protected: &Protected,
    quote_depth: usize,
) -> Result<Vec<Node>, SymwalkError> {
    let mut region = protected.clone();
    Substituter { replace }.traverse(forms, &mut region, quote_depth)
}

// ============================================================================
// TRAVERSAL
// ============================================================================

pub(crate) struct Substituter<'a> {
    replace: &'a dyn Replacer,
}

impl Substituter<'_> {
    fn expand(&self, node: &Node, region: &mut Protected, depth: usize) -> Result<Node, SymwalkError> {
        match node {
            Node::Atom(_) => Ok(node.clone()),
            Node::Symbol(_) if depth > 0 => Ok(node.clone()),
            Node::Symbol(name) => self.expand_symbol(node, name, region),
            Node::Sequence(kind, items) => {
                Ok(Node::Sequence(*kind, self.traverse(items, region, depth)?))
            }
            Node::Expression(items) if items.is_empty() => Ok(node.clone()),
            Node::Expression(items) if depth > 0 => self.expand_quoted(items, region, depth),
            Node::Expression(items) => self.expand_form(node, items, region),
        }
    }

    fn traverse(
        &self,
        items: &[Node],
        region: &mut Protected,
        depth: usize,
    ) -> Result<Vec<Node>, SymwalkError> {
        items.iter().map(|item| self.expand(item, region, depth)).collect()
    }

    /// Keeps the head of `items` and traverses the rest.
    fn rebuild_head(
        &self,
        items: &[Node],
        region: &mut Protected,
        depth: usize,
    ) -> Result<Node, SymwalkError> {
        let mut out = Vec::with_capacity(items.len());
        out.push(items[0].clone());
        out.extend(self.traverse(&items[1..], region, depth)?);
        Ok(Node::Expression(out))
    }

    fn expand_symbol(
        &self,
        node: &Node,
        name: &str,
        region: &mut Protected,
    ) -> Result<Node, SymwalkError> {
        if let Some(dot_form) = canonical_dot_form(name) {
            return self.expand(&dot_form, region, 0);
        }
        if region.contains(name) {
            return Ok(node.clone());
        }
        Ok(self.replace.replace(name).unwrap_or_else(|| node.clone()))
    }

    fn expand_quoted(
        &self,
        items: &[Node],
        region: &mut Protected,
        depth: usize,
    ) -> Result<Node, SymwalkError> {
        match items[0].as_symbol().and_then(forms::classify) {
            Some(FormKind::Unquote) => self.rebuild_head(items, region, depth - 1),
            Some(FormKind::Quasiquote) => self.rebuild_head(items, region, depth + 1),
            _ => Ok(Node::Expression(self.traverse(items, region, depth)?)),
        }
    }

    fn expand_form(
        &self,
        node: &Node,
        items: &[Node],
        region: &mut Protected,
    ) -> Result<Node, SymwalkError> {
        let Some(kind) = items[0].as_symbol().and_then(forms::classify) else {
            return Ok(Node::Expression(self.traverse(items, region, 0)?));
        };
        match kind {
            FormKind::Quote | FormKind::Opaque => Ok(node.clone()),
            FormKind::Quasiquote => self.rebuild_head(items, region, 1),
            FormKind::Unquote => Err(err_msg!(
                QuotationUnderflow,
                "'{}' is not inside a quasiquote: {}",
                items[0],
                node
            )),
            FormKind::Declaration => {
                region.extend(
                    items[1..]
                        .iter()
                        .filter_map(Node::as_symbol)
                        .map(str::to_string),
                );
                Ok(node.clone())
            }
            FormKind::Except => self.expand_except(items, region),
            FormKind::Dot => self.expand_dot(items, region),
            FormKind::DefClass => self.expand_defclass(items, region),
            FormKind::Match => patterns::expand_match(self, items, region),
            FormKind::Fn => params::expand_fn(self, items, region),
            FormKind::Defn => params::expand_defn(self, items, region),
            FormKind::Special => self.rebuild_head(items, region, 0),
        }
    }

    // ------------------------------------------------------------------------
    // Form rules
    // ------------------------------------------------------------------------

    // (except [name ExcType] body...)
    fn expand_except(&self, items: &[Node], region: &mut Protected) -> Result<Node, SymwalkError> {
        let mut clause = region.clone();
        if let Some(name) = items.get(1).and_then(exception_binding) {
            clause.insert(name.to_string());
        }
        self.rebuild_head(items, &mut clause, 0)
    }

    // (. obj attr (method args) [index])
    fn expand_dot(&self, items: &[Node], region: &mut Protected) -> Result<Node, SymwalkError> {
        if items.len() < 2 {
            return Ok(Node::Expression(items.to_vec()));
        }
        let mut out = vec![items[0].clone(), self.expand(&items[1], region, 0)?];
        for item in &items[2..] {
            let rewritten = match item {
                Node::Symbol(_) => item.clone(),
                Node::Expression(call) if call.first().and_then(Node::as_symbol).is_some() => {
                    self.rebuild_head(call, region, 0)?
                }
                other => self.expand(other, region, 0)?,
            };
            out.push(rewritten);
        }
        Ok(Node::Expression(out))
    }

    fn expand_defclass(&self, items: &[Node], region: &mut Protected) -> Result<Node, SymwalkError> {
        if items.len() < 2 {
            return Ok(Node::Expression(items.to_vec()));
        }
        let mut out = vec![items[0].clone(), items[1].clone()];
        out.extend(self.traverse(&items[2..], region, 0)?);
        Ok(Node::Expression(out))
    }
}

/// The name bound by an `except` clause header `[name ExcType]`.
fn exception_binding(header: &Node) -> Option<&str> {
    match header {
        Node::Sequence(crate::ast::SeqKind::List, parts) if parts.len() == 2 => parts[0].as_symbol(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_one;
    use crate::ErrorType;

    fn sub_x(source: &str) -> String {
        let tree = parse_one(source).unwrap();
        let replace = |name: &str| (name == "x").then(|| Node::sym("X"));
        substitute(&tree, &replace, &Protected::new(), 0)
            .unwrap()
            .to_string()
    }

    #[test]
    fn replaces_free_symbols_everywhere() {
        assert_eq!(sub_x("(f x [x #{x}] {x 1})"), "(f X [X #{X}] {X 1})");
        assert_eq!(sub_x("(x 1)"), "(X 1)");
    }

    #[test]
    fn quote_and_compile_time_forms_are_untouched() {
        assert_eq!(sub_x("(quote (f x))"), "(quote (f x))");
        assert_eq!(sub_x("(require x)"), "(require x)");
        assert_eq!(sub_x("(import x)"), "(import x)");
    }

    #[test]
    fn quasiquote_only_substitutes_unquoted() {
        assert_eq!(
            sub_x("`(print x ~x ~@[x])"),
            "(quasiquote (print x (unquote X) (unquote-splice [X])))"
        );
        // a second quasiquote needs a second unquote
        assert_eq!(
            sub_x("`(a `(b ~x ~~x))"),
            "(quasiquote (a (quasiquote (b (unquote x) (unquote (unquote X))))))"
        );
        assert_eq!(sub_x("`(quote ~x)"), "(quasiquote (quote (unquote X)))");
    }

    #[test]
    fn unquote_at_depth_zero_is_an_error() {
        let tree = parse_one("(f ~x)").unwrap();
        let replace = |_: &str| None;
        let err = substitute(&tree, &replace, &Protected::new(), 0).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::QuotationUnderflow);
    }

    #[test]
    fn dotted_symbols_substitute_only_the_object() {
        assert_eq!(sub_x("(print x.real.imag)"), "(print (. X real imag))");
        assert_eq!(sub_x("(. x x (x x) [x])"), "(. X x (x X) [X])");
        assert_eq!(sub_x("(.append x 1)"), "(.append X 1)");
    }

    #[test]
    fn special_form_heads_are_never_renamed() {
        let tree = parse_one("(setv get (get d get))").unwrap();
        let replace = |name: &str| (name == "get" || name == "setv").then(|| Node::sym("Z"));
        let out = substitute(&tree, &replace, &Protected::new(), 0).unwrap();
        assert_eq!(out.to_string(), "(setv Z (get d Z))");
    }

    #[test]
    fn except_protects_its_name_within_the_clause() {
        assert_eq!(
            sub_x("(try (f x) (except [x ValueError] x) (except [e Exception] x))"),
            "(try (f X) (except [x ValueError] x) (except [e Exception] X))"
        );
    }

    #[test]
    fn defclass_keeps_its_name() {
        assert_eq!(sub_x("(defclass x [Base] (setv y x))"), "(defclass x [Base] (setv y X))");
    }

    #[test]
    fn global_protects_later_siblings_of_the_same_region() {
        assert_eq!(sub_x("(do x (global x) x)"), "(do X (global x) x)");
        // the declaration stays inside the function's own region
        assert_eq!(sub_x("(do (fn [] (global x) x) x)"), "(do (fn [] (global x) x) X)");
    }

    #[test]
    fn sibling_branches_do_not_share_parameters() {
        assert_eq!(sub_x("(do (fn [x] x) x (fn [y] x))"), "(do (fn [x] x) X (fn [y] X))");
    }

    #[test]
    fn caller_protected_names_are_kept() {
        let tree = parse_one("(f x y)").unwrap();
        let replace = |name: &str| Some(Node::sym(name.to_uppercase()));
        let protected: Protected = ["x".to_string()].into_iter().collect();
        let out = substitute(&tree, &replace, &protected, 0).unwrap();
        assert_eq!(out.to_string(), "(F x Y)");
    }

    #[test]
    fn substitute_forms_shares_one_region() {
        let forms = crate::syntax::parse("(nonlocal x) (f x)").unwrap();
        let replace = |name: &str| (name == "x").then(|| Node::int(0));
        let out = substitute_forms(&forms, &replace, &Protected::new(), 0).unwrap();
        assert_eq!(out[1].to_string(), "(f x)");
    }

    #[test]
    fn replacement_is_not_resubstituted() {
        let tree = parse_one("(f x)").unwrap();
        let replace = |name: &str| (name == "x").then(|| Node::call("g", [Node::sym("x")]));
        let out = substitute(&tree, &replace, &Protected::new(), 0).unwrap();
        assert_eq!(out.to_string(), "(f (g x))");
    }
}
