//! The expansion driver and template macro expansion.
//!
//! `expand_all` walks a tree depth-first, left to right, handing every
//! unquoted form to the host. When the host expands a form, the driver is
//! re-applied to the result, so macros that expand into macro calls are
//! expanded transitively.
//!
//! ## Quotation
//!
//! The quotation depth is threaded as a plain argument. Under `quasiquote` the
//! driver only tracks depth; macros run again once an `unquote` brings the
//! depth back to zero. `quote` is never entered.

use indexmap::IndexMap;

use crate::ast::{Node, SeqKind};
use crate::macros::types::MacroTemplate;
use crate::macros::HostCompiler;
use crate::scope::{substitute, Protected};
use crate::{err_msg, SymwalkError};

// =============================
// Public API for macro expansion
// =============================

/// Expands every macro call in `tree`.
///
/// Errors raised by the host propagate unchanged; there is no partial output.
pub fn expand_all(tree: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    Expander { host, nesting: 0 }.expand(tree, 0)
}

/// Performs a single expansion step on `form`, returning it unchanged if its
/// head is not a macro.
pub fn expand_once(form: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    Ok(host.try_expand(form)?.unwrap_or_else(|| form.clone()))
}

/// Expands a template macro call by substituting arguments into the body.
///
/// Parameters are replaced through the substitution engine, so binders and
/// quotation inside the body are respected. The rest parameter is bound to a
/// fresh placeholder first; `#* rest` then splices the remaining arguments in
/// place and a bare `rest` becomes a tuple of them.
///
/// A body written as `` `form `` produces the code it builds: its outer
/// `~x` become the substituted arguments and `~@xs` splices in place.
pub fn expand_template(
    macro_name: &str,
    template: &MacroTemplate,
    call: &Node,
    host: &mut dyn HostCompiler,
) -> Result<Node, SymwalkError> {
    let args = match call.as_expression() {
        Some([_, args @ ..]) => args,
        _ => return Err(err_msg!(Macro, "macro '{}' must be called as a form", macro_name)),
    };
    template.check_arity(macro_name, args.len())?;

    let mut bindings: IndexMap<String, Node> = template
        .params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect();

    let placeholder = template.rest.as_ref().map(|rest_name| {
        let placeholder = host.fresh(rest_name);
        bindings.insert(rest_name.clone(), Node::sym(placeholder.as_str()));
        placeholder
    });
    let body = substitute(&template.body, &bindings, &Protected::new(), 0)?;
    let body = unwrap_quasiquote(body);
    Ok(match placeholder {
        Some(placeholder) => splice_rest(&body, &placeholder, &args[template.params.len()..]),
        None => body,
    })
}

// =============================
// Internal expansion helpers
// =============================

struct Expander<'h> {
    host: &'h mut dyn HostCompiler,
    /// Transitive expansions currently being re-expanded.
    nesting: usize,
}

impl Expander<'_> {
    fn expand(&mut self, node: &Node, depth: usize) -> Result<Node, SymwalkError> {
        match node {
            Node::Sequence(kind, items) => Ok(Node::Sequence(*kind, self.expand_each(items, depth)?)),
            Node::Expression(items) if !items.is_empty() => self.expand_form(node, items, depth),
            _ => Ok(node.clone()),
        }
    }

    fn expand_each(&mut self, items: &[Node], depth: usize) -> Result<Vec<Node>, SymwalkError> {
        items.iter().map(|item| self.expand(item, depth)).collect()
    }

    fn expand_tail(&mut self, items: &[Node], depth: usize) -> Result<Node, SymwalkError> {
        let mut out = Vec::with_capacity(items.len());
        out.push(items[0].clone());
        out.extend(self.expand_each(&items[1..], depth)?);
        Ok(Node::Expression(out))
    }

    fn expand_form(&mut self, node: &Node, items: &[Node], depth: usize) -> Result<Node, SymwalkError> {
        let head = items[0].as_symbol();
        if depth > 0 {
            return match head {
                Some("unquote" | "unquote-splice") => self.expand_tail(items, depth - 1),
                Some("quasiquote") => self.expand_tail(items, depth + 1),
                _ => Ok(Node::Expression(self.expand_each(items, depth)?)),
            };
        }
        match head {
            Some("quote") => Ok(node.clone()),
            Some("quasiquote") => self.expand_tail(items, 1),
            Some(op @ ("unquote" | "unquote-splice")) => Err(err_msg!(
                QuotationUnderflow,
                "'{}' is not inside a quasiquote: {}",
                op,
                node
            )),
            Some("require") => {
                self.host.compile_side_effect(node)?;
                Ok(node.clone())
            }
            Some("except" | "except*" | "unpack-mapping") => self.expand_tail(items, 0),
            _ => match self.host.try_expand(node)? {
                Some(expansion) => self.reexpand(&expansion),
                None => Ok(Node::Expression(self.expand_each(items, 0)?)),
            },
        }
    }

    fn reexpand(&mut self, expansion: &Node) -> Result<Node, SymwalkError> {
        if let Some(limit) = self.host.recursion_limit() {
            if self.nesting >= limit {
                return Err(err_msg!(
                    RecursionLimit,
                    "expansion nested more than {} level(s) deep: {}",
                    limit,
                    expansion
                )
                .with_help("raise `recursion_limit` or check the macro for self-expansion"));
            }
        }
        self.nesting += 1;
        let result = self.expand(expansion, 0);
        self.nesting -= 1;
        result
    }
}

/// Replaces `(unpack-iterable placeholder)` elements with `args` in place and a
/// bare `placeholder` with a tuple of `args`.
fn splice_rest(node: &Node, placeholder: &str, args: &[Node]) -> Node {
    match node {
        Node::Symbol(name) if name == placeholder => Node::tuple(args.to_vec()),
        Node::Expression(items) | Node::Sequence(_, items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_expression() {
                    Some([op, target])
                        if op.as_symbol() == Some("unpack-iterable")
                            && target.as_symbol() == Some(placeholder) =>
                    {
                        out.extend(args.iter().cloned())
                    }
                    _ => out.push(splice_rest(item, placeholder, args)),
                }
            }
            node.with_elements(out)
        }
        _ => node.clone(),
    }
}

/// Strips a top-level `quasiquote` from a template body.
fn unwrap_quasiquote(body: Node) -> Node {
    match body.as_expression() {
        Some([head, inner]) if head.as_symbol() == Some("quasiquote") => unquasi(inner, 1),
        _ => body,
    }
}

fn unquasi(node: &Node, depth: usize) -> Node {
    if depth == 0 {
        return node.clone();
    }
    if let Some([head, inner]) = node.as_expression() {
        match head.as_symbol() {
            Some("unquote") if depth == 1 => return inner.clone(),
            Some("unquote-splice") if depth == 1 => {
                return Node::call("unpack-iterable", [inner.clone()])
            }
            _ => {}
        }
    }
    match node {
        Node::Expression(items) if !items.is_empty() => {
            let inner_depth = match items[0].as_symbol() {
                Some("quasiquote") => depth + 1,
                Some("unquote" | "unquote-splice") => depth - 1,
                _ => return node.with_elements(unquasi_items(items, depth)),
            };
            let mut out = vec![items[0].clone()];
            out.extend(unquasi_items(&items[1..], inner_depth));
            node.with_elements(out)
        }
        Node::Expression(items) | Node::Sequence(_, items) => node.with_elements(unquasi_items(items, depth)),
        Node::Symbol(_) | Node::Atom(_) => node.clone(),
    }
}

// `~@[a b]` splices literally; any other `~@e` becomes `#* e`.
fn unquasi_items(items: &[Node], depth: usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item.as_expression() {
            Some([op, Node::Sequence(SeqKind::List | SeqKind::Tuple, parts)])
                if depth == 1 && op.as_symbol() == Some("unquote-splice") =>
            {
                out.extend(parts.iter().cloned())
            }
            _ => out.push(unquasi(item, depth)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{MacroDef, MacroEnv, MacroFn};
    use crate::syntax::parse_one;
    use crate::ErrorType;

    // (inc x) => (+ x 1)
    fn inc_env() -> MacroEnv {
        let inc: MacroFn = |form, _| {
            let arg = form.elements().and_then(|items| items.get(1)).cloned();
            Ok(Node::call("+", arg.into_iter().chain([Node::int(1)])))
        };
        MacroEnv::default().with_user_macro("inc", MacroDef::Fn(inc))
    }

    fn expand_str(env: &mut MacroEnv, source: &str) -> String {
        expand_all(&parse_one(source).unwrap(), env).unwrap().to_string()
    }

    #[test]
    fn expands_nested_calls_depth_first() {
        let mut env = inc_env();
        assert_eq!(expand_str(&mut env, "(f (inc (inc 1)) [(inc 2)])"), "(f (+ (+ 1 1) 1) [(+ 2 1)])");
        assert_eq!(env.trace().len(), 3);
        assert_eq!(env.trace()[0].input.to_string(), "(inc (inc 1))");
    }

    #[test]
    fn quotation_suppresses_expansion() {
        let mut env = inc_env();
        assert_eq!(expand_str(&mut env, "'(inc 1)"), "(quote (inc 1))");
        assert_eq!(
            expand_str(&mut env, "`(inc ~(inc 1) `(inc ~(inc 2)))"),
            "(quasiquote (inc (unquote (+ 1 1)) (quasiquote (inc (unquote (inc 2))))))"
        );
    }

    #[test]
    fn unquote_outside_quasiquote_fails() {
        let mut env = inc_env();
        let err = expand_all(&parse_one("(f ~@xs)").unwrap(), &mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::QuotationUnderflow);
    }

    #[test]
    fn tail_only_heads_are_never_macro_calls() {
        let shadow: MacroFn = |_, _| Ok(Node::sym("WRONG"));
        let mut env = ["except", "except*", "unpack-mapping"]
            .into_iter()
            .fold(inc_env(), |env, name| env.with_user_macro(name, MacroDef::Fn(shadow)));
        assert_eq!(
            expand_str(&mut env, "(try (f) (except [e E] e))"),
            "(try (f) (except [e E] e))"
        );
        assert_eq!(
            expand_str(&mut env, "(try (f) (except* [e E] (inc e)))"),
            "(try (f) (except* [e E] (+ e 1)))"
        );
        assert_eq!(expand_str(&mut env, "(f (unpack-mapping d))"), "(f (unpack-mapping d))");
        assert_eq!(
            expand_str(&mut env, "(f #** (inc d))"),
            "(f (unpack-mapping (+ d 1)))"
        );
        assert!(env.trace().iter().all(|step| step.macro_name == "inc"));
    }

    #[test]
    fn require_is_compiled_and_kept() {
        let mut env = inc_env();
        assert_eq!(expand_str(&mut env, "(require m [inc])"), "(require m [inc])");
        assert_eq!(env.required.len(), 1);
    }

    #[test]
    fn expansion_is_idempotent_on_expanded_code() {
        let mut env = inc_env();
        let once = expand_all(&parse_one("(do (inc x) `(inc ~(inc y)))").unwrap(), &mut env).unwrap();
        let twice = expand_all(&once, &mut env).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn runaway_expansion_hits_the_limit() {
        let forever: MacroFn = |form, _| Ok(form.clone());
        let mut env = MacroEnv::default().with_user_macro("loop", MacroDef::Fn(forever));
        env.config.recursion_limit = Some(16);
        let err = expand_all(&parse_one("(loop)").unwrap(), &mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::RecursionLimit);
    }

    #[test]
    fn expand_once_takes_a_single_step() {
        let mut env = inc_env();
        let out = expand_once(&parse_one("(inc (inc 1))").unwrap(), &mut env).unwrap();
        assert_eq!(out.to_string(), "(+ (inc 1) 1)");
        let out = expand_once(&parse_one("(g 1)").unwrap(), &mut env).unwrap();
        assert_eq!(out.to_string(), "(g 1)");
    }

    #[test]
    fn template_splices_rest_arguments() {
        let template = MacroTemplate::new(
            vec!["test".into()],
            Some("body".into()),
            parse_one("(if test None (do #* body (len body)))").unwrap(),
        )
        .unwrap();
        let mut env = MacroEnv::default();
        let call = parse_one("(unless ok (a) (b))").unwrap();
        let out = expand_template("unless", &template, &call, &mut env).unwrap();
        assert_eq!(out.to_string(), "(if ok None (do (a) (b) (len #((a) (b)))))");
    }

    #[test]
    fn template_respects_binders_in_its_body() {
        let template = MacroTemplate::new(
            vec!["x".into()],
            None,
            parse_one("(+ x ((fn [x] x) 1) 'x)").unwrap(),
        )
        .unwrap();
        let mut env = MacroEnv::default();
        let out = expand_template("m", &template, &parse_one("(m 5)").unwrap(), &mut env).unwrap();
        assert_eq!(out.to_string(), "(+ 5 ((fn [x] x) 1) (quote x))");
    }

    #[test]
    fn quasiquoted_template_body_builds_code() {
        let template = MacroTemplate::new(
            vec!["x".into()],
            None,
            parse_one("`(f ~x x ~@[1 2] `(g ~~x))").unwrap(),
        )
        .unwrap();
        let mut env = MacroEnv::default();
        let out = expand_template("m", &template, &parse_one("(m 5)").unwrap(), &mut env).unwrap();
        assert_eq!(out.to_string(), "(f 5 x 1 2 (quasiquote (g (unquote 5))))");
    }

    #[test]
    fn quasiquoted_template_splices_rest_arguments() {
        let template = MacroTemplate::new(
            vec!["c".into()],
            Some("body".into()),
            parse_one("`(if ~c (do ~@body) ~body)").unwrap(),
        )
        .unwrap();
        let mut env = MacroEnv::default();
        let call = parse_one("(when t (a) (b))").unwrap();
        let out = expand_template("when", &template, &call, &mut env).unwrap();
        assert_eq!(out.to_string(), "(if t (do (a) (b)) #((a) (b)))");
    }

    #[test]
    fn template_arity_errors_are_macro_errors() {
        let template = MacroTemplate::new(vec!["x".into()], None, Node::sym("x")).unwrap();
        let mut env = MacroEnv::default();
        let err = expand_template("m", &template, &parse_one("(m)").unwrap(), &mut env).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Macro);
    }
}
