//! Built-in macros registered in every `MacroEnv`.
//!
//! Both are thin adapters from a call form to the lexical module, which does
//! the actual work.

use crate::ast::Node;
use crate::lexical;
use crate::macros::{HostCompiler, MacroRegistry};
use crate::SymwalkError;

/// Registers all standard macros in the given registry.
pub fn register_std_macros(registry: &mut MacroRegistry) {
    registry.register("let", expand_let_macro);
    registry.register("smacrolet", expand_smacrolet_macro);
}

// (let [bindings...] body...)
fn expand_let_macro(form: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    lexical::expand_let_form(form, host)
}

// (smacrolet [name replacement ...] body...)
fn expand_smacrolet_macro(form: &Node, host: &mut dyn HostCompiler) -> Result<Node, SymwalkError> {
    lexical::expand_smacrolet_form(form, host)
}
