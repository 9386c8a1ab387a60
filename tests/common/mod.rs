//! Shared helpers for the integration suites.

#![allow(dead_code)]

use symwalk::ast::Node;
use symwalk::macros::{expand_all, MacroEnv};
use symwalk::syntax::{parse, parse_one};
use symwalk::SymwalkError;

/// Expands every form of `source` with a fresh default environment and prints
/// the result one form per line, without the trailing newline.
pub fn expand_str(source: &str) -> Result<String, SymwalkError> {
    let mut env = MacroEnv::default();
    expand_with(source, &mut env)
}

/// Like [`expand_str`] but with a caller-owned environment.
pub fn expand_with(source: &str, env: &mut MacroEnv) -> Result<String, SymwalkError> {
    let program = parse(source)?;
    env.reserve_program(&program);
    let forms = env.load_definitions(program)?;
    let expanded = forms
        .iter()
        .map(|form| expand_all(form, env).map(|node| node.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(expanded.join("\n"))
}

/// Parses a single form, panicking on reader errors.
pub fn form(source: &str) -> Node {
    parse_one(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
}
