//! # Macro expansion
//!
//! Purely syntactic transformation of code trees before compilation. The
//! driver in [`expander`] walks a tree and asks a [`HostCompiler`] whether each
//! form is a macro call; the host owns the macro definitions, generates fresh
//! names, and performs compile-time side effects such as `require`.
//!
//! [`MacroEnv`] is the reference host: a user registry consulted before a core
//! registry holding `let` and `smacrolet`, template macros read from
//! `defmacro` forms by [`loader`], and an optional trace of every expansion.
//!
//! ## Example
//!
//! ```rust
//! use symwalk::macros::{expand_all, MacroEnv};
//! use symwalk::syntax::parse_one;
//!
//! let mut env = MacroEnv::default();
//! let form = parse_one("(smacrolet [n 42] (print n))").unwrap();
//! let out = expand_all(&form, &mut env).unwrap();
//! assert_eq!(out.to_string(), "(do (print 42))");
//! assert_eq!(env.trace().len(), 1);
//! ```

use tracing::{debug, trace};

use crate::ast::Node;
use crate::{err_msg, SymwalkError};

pub mod expander;
pub mod loader;
pub mod registry;
pub mod std_macros;
pub mod types;

pub use expander::{expand_all, expand_once, expand_template};
pub use registry::MacroRegistry;
pub use types::{MacroDef, MacroEnv, MacroExpansionStep, MacroFn, MacroProvenance, MacroTemplate};

/// The compiler services macro expansion depends on.
pub trait HostCompiler {
    /// Expands `form` one step if its head names a macro.
    ///
    /// Errors raised by the macro propagate unchanged.
    fn try_expand(&mut self, form: &Node) -> Result<Option<Node>, SymwalkError>;

    /// Performs the compile-time effect of a `require` form.
    fn compile_side_effect(&mut self, form: &Node) -> Result<(), SymwalkError>;

    /// Returns a name that collides with no program name and no earlier result.
    fn fresh(&mut self, hint: &str) -> String;

    /// Maximum nesting of transitive expansions; `None` is unbounded.
    fn recursion_limit(&self) -> Option<usize> {
        None
    }
}

impl HostCompiler for MacroEnv {
    fn try_expand(&mut self, form: &Node) -> Result<Option<Node>, SymwalkError> {
        let Some(name) = form.head_symbol() else {
            return Ok(None);
        };
        // Copy the definition out so the macro can borrow the environment.
        let Some((provenance, def)) = self
            .lookup_macro(name)
            .map(|(provenance, def)| (provenance, def.clone()))
        else {
            return Ok(None);
        };
        // Names in the call may reach the output; fresh names must avoid them.
        self.names.reserve_symbols(form);

        if let Some(limit) = self.recursion_limit() {
            if self.active >= limit {
                return Err(err_msg!(
                    RecursionLimit,
                    "macro '{}' nested more than {} expansion(s) deep",
                    name,
                    limit
                )
                .with_help("raise `recursion_limit` or check the macro for self-expansion"));
            }
        }

        trace!(macro_name = name, ?provenance, "invoking macro");
        self.active += 1;
        let result = match &def {
            MacroDef::Fn(func) => func(form, self),
            MacroDef::Template(template) => expand_template(name, template, form, self),
        };
        self.active -= 1;
        let output = result?;

        debug!(macro_name = name, input = %form, output = %output, "expanded macro");
        if self.config.record_trace {
            self.trace.push(MacroExpansionStep {
                macro_name: name.to_string(),
                provenance,
                input: form.clone(),
                output: output.clone(),
            });
        }
        Ok(Some(output))
    }

    fn compile_side_effect(&mut self, form: &Node) -> Result<(), SymwalkError> {
        debug!(form = %form, "recording require");
        self.required.push(form.clone());
        Ok(())
    }

    fn fresh(&mut self, hint: &str) -> String {
        self.names.fresh(hint)
    }

    fn recursion_limit(&self) -> Option<usize> {
        self.config.recursion_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpandConfig;
    use crate::syntax::parse_one;
    use crate::ErrorType;

    #[test]
    fn non_macro_forms_are_declined() {
        let mut env = MacroEnv::default();
        assert!(env.try_expand(&parse_one("(print 1)").unwrap()).unwrap().is_none());
        assert!(env.try_expand(&parse_one("((f) 1)").unwrap()).unwrap().is_none());
        assert!(env.trace().is_empty());
    }

    #[test]
    fn trace_records_provenance() {
        let twice: MacroFn = |form, _| {
            let items = form.elements().unwrap_or_default();
            Ok(Node::call("do", items[1..].iter().chain(&items[1..]).cloned()))
        };
        let mut env = MacroEnv::default().with_user_macro("twice", MacroDef::Fn(twice));
        let out = env.try_expand(&parse_one("(twice (f))").unwrap()).unwrap().unwrap();
        assert_eq!(out.to_string(), "(do (f) (f))");
        assert_eq!(env.trace()[0].macro_name, "twice");
        assert_eq!(env.trace()[0].provenance, MacroProvenance::User);
    }

    #[test]
    fn fresh_names_avoid_symbols_of_the_expanded_form() {
        let mut env = MacroEnv::default();
        let form = parse_one("(let [a 1] (print _sw_let_1 a))").unwrap();
        let out = crate::macros::expand_all(&form, &mut env).unwrap();
        assert_eq!(
            out.to_string(),
            "(do (setv _sw_let_2 {} (get _sw_let_2 \"a\") 1) (print _sw_let_1 (get _sw_let_2 \"a\")))"
        );
    }

    #[test]
    fn trace_can_be_disabled() {
        let config = ExpandConfig {
            record_trace: false,
            ..ExpandConfig::default()
        };
        let mut env = MacroEnv::new(config);
        env.try_expand(&parse_one("(smacrolet [] 1)").unwrap()).unwrap();
        assert!(env.trace().is_empty());
    }

    #[test]
    fn macro_errors_propagate_unchanged() {
        let failing: MacroFn = |_, _| Err(err_msg!(InvalidBindTarget, "boom"));
        let mut env = MacroEnv::default().with_user_macro("fail", MacroDef::Fn(failing));
        let err = env.try_expand(&parse_one("(fail)").unwrap()).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::InvalidBindTarget);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn require_is_recorded() {
        let mut env = MacroEnv::default();
        let form = parse_one("(require mod [m])").unwrap();
        env.compile_side_effect(&form).unwrap();
        assert_eq!(env.required, vec![form]);
    }
}
