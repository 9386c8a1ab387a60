//! Core types of the macro system.
//!
//! This module has no dependencies on the other macro modules: it defines the
//! macro function signature, template macros, trace records, and the
//! `MacroEnv` that owns the registries.
//!
//! ## Ownership
//!
//! - `MacroFn` is a function pointer and is copied out of the registry before
//!   it is called, so a macro may freely use the environment it lives in.
//! - `MacroTemplate` owns its parameters and body.
//! - `MacroEnv` owns both registries, the trace, and the name generator.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::config::ExpandConfig;
use crate::gensym::Gensym;
use crate::macros::registry::MacroRegistry;
use crate::macros::HostCompiler;
use crate::{err_msg, SymwalkError};

/// A native macro: receives the whole call form and the compiler it runs in.
///
/// # Examples
///
/// ```rust
/// use symwalk::ast::Node;
/// use symwalk::macros::MacroFn;
/// // (twice x) => (do x x)
/// let twice: MacroFn = |form, _host| {
///     let arg = form.elements().and_then(|items| items.get(1)).cloned().unwrap_or(Node::sym("None"));
///     Ok(Node::call("do", [arg.clone(), arg]))
/// };
/// ```
pub type MacroFn = fn(&Node, &mut dyn HostCompiler) -> Result<Node, SymwalkError>;

/// A declarative macro: parameters substituted into a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroTemplate {
    /// Required positional parameters.
    pub params: Vec<String>,
    /// `#* rest` parameter collecting the remaining arguments.
    pub rest: Option<String>,
    pub body: Node,
}

/// A macro definition, either a native function or a template.
///
/// Only `Template` is serializable; function pointers are skipped by the
/// registry's serializer.
#[derive(Debug, Clone)]
pub enum MacroDef {
    Fn(MacroFn),
    Template(MacroTemplate),
}

/// Which registry a macro was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacroProvenance {
    /// Defined by the program being expanded
    User,
    /// Built in
    Core,
}

/// A single macro expansion step, for traceability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroExpansionStep {
    pub macro_name: String,
    pub provenance: MacroProvenance,
    /// The call form before expansion
    pub input: Node,
    /// The form the macro returned, before its own macros are expanded
    pub output: Node,
}

/// Reference compiler: user and core registries, expansion trace, and the
/// fresh-name generator for one compilation unit.
///
/// # Examples
///
/// ```rust
/// use symwalk::config::ExpandConfig;
/// use symwalk::macros::{MacroEnv, MacroProvenance};
///
/// let env = MacroEnv::new(ExpandConfig::default());
/// assert!(env.user_macros.is_empty());
/// assert!(matches!(env.lookup_macro("let"), Some((MacroProvenance::Core, _))));
/// assert!(env.trace().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct MacroEnv {
    pub user_macros: MacroRegistry,
    pub core_macros: MacroRegistry,
    pub trace: Vec<MacroExpansionStep>,
    /// `require` forms seen during expansion, in order.
    pub required: Vec<Node>,
    pub names: Gensym,
    pub config: ExpandConfig,
    /// Macro calls currently running, innermost last.
    pub(crate) active: usize,
}

// ============================================================================
// IMPLEMENTATIONS
// ============================================================================

impl MacroTemplate {
    /// Builds a template, rejecting duplicate parameter names.
    pub fn new(params: Vec<String>, rest: Option<String>, body: Node) -> Result<Self, SymwalkError> {
        let mut seen = HashSet::new();
        for name in params.iter().chain(rest.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(err_msg!(Macro, "duplicate macro parameter '{}'", name));
            }
        }
        Ok(MacroTemplate { params, rest, body })
    }

    /// Checks a call's argument count against the parameter list.
    pub fn check_arity(&self, macro_name: &str, args_len: usize) -> Result<(), SymwalkError> {
        let required = self.params.len();
        if args_len < required || (args_len > required && self.rest.is_none()) {
            let expected = if self.rest.is_some() {
                format!("at least {}", required)
            } else {
                required.to_string()
            };
            return Err(err_msg!(
                Macro,
                "macro '{}' expects {} argument(s), got {}",
                macro_name,
                expected,
                args_len
            ));
        }
        Ok(())
    }
}

impl MacroEnv {
    /// Creates an environment with the standard macros registered.
    pub fn new(config: ExpandConfig) -> Self {
        let mut core_macros = MacroRegistry::new();
        crate::macros::std_macros::register_std_macros(&mut core_macros);
        Self {
            user_macros: MacroRegistry::new(),
            core_macros,
            trace: Vec::new(),
            required: Vec::new(),
            names: Gensym::new(config.gensym_prefix.clone()),
            config,
            active: 0,
        }
    }

    /// Creates an environment whose fresh names avoid every symbol of `program`.
    ///
    /// Generated namespaces are visible at function scope, so sibling
    /// top-level forms must be reserved as well as the form being expanded.
    pub fn for_program(config: ExpandConfig, program: &[Node]) -> Self {
        let mut env = Self::new(config);
        env.reserve_program(program);
        env
    }

    /// Marks every symbol of `program` as unavailable for fresh names.
    pub fn reserve_program(&mut self, program: &[Node]) {
        for form in program {
            self.names.reserve_symbols(form);
        }
    }

    /// Adds a user-defined macro to the environment.
    pub fn with_user_macro(mut self, name: &str, def: MacroDef) -> Self {
        self.user_macros.insert(name, def);
        self
    }

    /// Looks up a macro by name, user registry first.
    #[inline]
    pub fn lookup_macro(&self, name: &str) -> Option<(MacroProvenance, &MacroDef)> {
        self.user_macros
            .lookup(name)
            .map(|def| (MacroProvenance::User, def))
            .or_else(|| {
                self.core_macros
                    .lookup(name)
                    .map(|def| (MacroProvenance::Core, def))
            })
    }

    pub fn trace(&self) -> &[MacroExpansionStep] {
        &self.trace
    }
}

impl Default for MacroEnv {
    fn default() -> Self {
        Self::new(ExpandConfig::default())
    }
}
