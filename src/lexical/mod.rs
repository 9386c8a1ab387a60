//! # Lexical bindings
//!
//! `let` compiles block-scoped bindings onto a target with only function-level
//! scope. Every `let` gets one fresh namespace dictionary, each bound name
//! becomes a `(get ns "name")` slot, and every free reference to the name in
//! later initializers and in the body is rewritten to that slot:
//!
//! ```text
//! (let [x 5 y (+ x 1)] y)
//! =>
//! (do (setv ns {} (get ns "x") 5 (get ns "y") (+ (get ns "x") 1))
//!     (get ns "y"))
//! ```
//!
//! `smacrolet` is the simpler sibling: it replaces names with arbitrary
//! expressions and creates no storage.

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{Node, SeqKind};
use crate::macros::{expand_all, HostCompiler};
use crate::scope::{substitute, substitute_forms, Protected};
use crate::{err_msg, SymwalkError};

pub mod destructure;

use destructure::{classify_target, leaves, BindTarget};

/// Expands a whole `(let [bindings...] body...)` form.
pub fn expand_let_form(form: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    let (bindings, body) = split_binding_form("let", form)?;
    expand_let(bindings, body, host)
}

/// Compiles `let` bindings and body into namespace-slot code.
///
/// # Examples
///
/// ```rust
/// use symwalk::lexical::expand_let;
/// use symwalk::macros::MacroEnv;
/// use symwalk::syntax::parse;
///
/// let bindings = parse("x 5 y (+ x 1)").unwrap();
/// let body = parse("y").unwrap();
/// let out = expand_let(&bindings, &body, &mut MacroEnv::default()).unwrap();
/// assert_eq!(
///     out.to_string(),
///     "(do (setv _sw_let_1 {} (get _sw_let_1 \"x\") 5 (get _sw_let_1 \"y\") (+ (get _sw_let_1 \"x\") 1)) (get _sw_let_1 \"y\"))"
/// );
/// ```
pub fn expand_let(
    bindings: &[Node],
    body: &[Node],
    host: &mut dyn HostCompiler,
) -> Result<Node, SymwalkError> {
    check_paired("let", bindings)?;
    for target in bindings.iter().step_by(2) {
        classify_target(target)?;
    }

    let bindings = expand_each(bindings, host)?;
    let body = expand_each(body, host)?;

    let ns = host.fresh("let");
    debug!(namespace = %ns, bindings = bindings.len() / 2, "compiling let");

    let no_protection = Protected::new();
    let mut table: IndexMap<String, Node> = IndexMap::new();
    let mut assignments = vec![Node::sym(ns.as_str()), Node::dict(vec![])];

    for pair in bindings.chunks(2) {
        let (target, value) = (&pair[0], &pair[1]);
        match classify_target(target)? {
            BindTarget::Name(name) => {
                let value = substitute(value, &table, &no_protection, 0)?;
                let slot = slot_for(&ns, name);
                table.insert(name.to_string(), slot.clone());
                assignments.extend([slot, value]);
            }
            BindTarget::Pattern(pattern) => {
                let placeholders: IndexMap<String, Node> = leaves(pattern)
                    .into_iter()
                    .map(|leaf| (leaf.to_string(), Node::sym(host.fresh(leaf))))
                    .collect();
                let unpacked = substitute(pattern, &placeholders, &no_protection, 0)?;
                let value = substitute(value, &table, &no_protection, 0)?;
                assignments.extend([unpacked, value]);
                for (leaf, placeholder) in placeholders {
                    let slot = slot_for(&ns, &leaf);
                    assignments.extend([slot.clone(), placeholder]);
                    table.insert(leaf, slot);
                }
            }
        }
    }

    let mut out = vec![Node::sym("do"), Node::call("setv", assignments)];
    out.extend(substitute_forms(&body, &table, &no_protection, 0)?);
    Ok(Node::Expression(out))
}

/// Expands a whole `(smacrolet [name replacement ...] body...)` form.
pub fn expand_smacrolet_form(form: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    let (bindings, body) = split_binding_form("smacrolet", form)?;
    expand_smacrolet(bindings, body, host)
}

/// Replaces every free occurrence of each bound name in the expanded body.
pub fn expand_smacrolet(
    bindings: &[Node],
    body: &[Node],
    host: &mut dyn HostCompiler,
) -> Result<Node, SymwalkError> {
    check_paired("smacrolet", bindings)?;
    let mut table: IndexMap<String, Node> = IndexMap::new();
    for pair in bindings.chunks(2) {
        match classify_target(&pair[0])? {
            BindTarget::Name(name) => {
                table.insert(name.to_string(), pair[1].clone());
            }
            BindTarget::Pattern(pattern) => {
                return Err(err_msg!(
                    InvalidBindTarget,
                    "smacrolet binds symbols only, got {}",
                    pattern
                ))
            }
        }
    }
    let body = expand_each(body, host)?;
    let mut out = vec![Node::sym("do")];
    out.extend(substitute_forms(&body, &table, &Protected::new(), 0)?);
    Ok(Node::Expression(out))
}

// ============================================================================
// HELPERS
// ============================================================================

fn split_binding_form<'a>(
    construct: &str,
    form: &'a Node,
) -> Result<(&'a [Node], &'a [Node]), SymwalkError> {
    match form.as_expression() {
        Some([_, bindings, body @ ..]) => match bindings.as_sequence(SeqKind::List) {
            Some(bindings) => Ok((bindings, body)),
            None => Err(err_msg!(
                MalformedBindings,
                "{} bindings must be a bracketed list, got {}",
                construct,
                bindings.type_name()
            )),
        },
        _ => Err(err_msg!(MalformedBindings, "{} needs a binding list: {}", construct, form)),
    }
}

fn check_paired(construct: &str, bindings: &[Node]) -> Result<(), SymwalkError> {
    if bindings.len() % 2 != 0 {
        return Err(err_msg!(
            MalformedBindings,
            "{} bindings must be paired, got {} form(s)",
            construct,
            bindings.len()
        )
        .with_help("write bindings as [name value name value ...]"));
    }
    Ok(())
}

fn expand_each(forms: &[Node], host: &mut dyn HostCompiler) -> Result<Vec<Node>, SymwalkError> {
    forms.iter().map(|form| expand_all(form, host)).collect()
}

/// `(get ns "name")`
fn slot_for(ns: &str, name: &str) -> Node {
    Node::call("get", [Node::sym(ns), Node::string(name)])
}
