//! Template macro loading.
//!
//! Reads `(defmacro name [params] body...)` forms into [`MacroTemplate`]s,
//! validating names and parameters and rejecting duplicate definitions.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::ast::{Node, SeqKind};
use crate::macros::types::{MacroEnv, MacroTemplate};
use crate::syntax::parse;
use crate::{err_msg, SymwalkError};

type MacroParseResult = Result<Vec<(String, MacroTemplate)>, SymwalkError>;

// =============================
// Public API for macro loading
// =============================

/// Parses every `defmacro` form in a source string, ignoring other forms.
pub fn parse_macros_from_source(source: &str) -> MacroParseResult {
    let (macros, _rest) = extract_macros(parse(source)?)?;
    Ok(macros)
}

/// Loads macro definitions from a file.
pub fn load_macros_from_file<P: AsRef<Path>>(path: P) -> MacroParseResult {
    let source = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        SymwalkError::from(e).with_help(format!(
            "check that the macro file {} exists and is readable",
            path.as_ref().display()
        ))
    })?;
    parse_macros_from_source(&source)
}

/// Splits a program into its macro definitions and the remaining forms.
///
/// # Examples
///
/// ```rust
/// use symwalk::macros::loader::extract_macros;
/// use symwalk::syntax::parse;
///
/// let program = parse("(defmacro twice [x] (do x x)) (twice (f))").unwrap();
/// let (macros, rest) = extract_macros(program).unwrap();
/// assert_eq!(macros[0].0, "twice");
/// assert_eq!(rest.len(), 1);
/// ```
pub fn extract_macros(program: Vec<Node>) -> Result<(Vec<(String, MacroTemplate)>, Vec<Node>), SymwalkError> {
    let mut macros = Vec::new();
    let mut rest = Vec::new();
    let mut names_seen = HashSet::new();
    for form in program {
        if !is_macro_definition(&form) {
            rest.push(form);
            continue;
        }
        let (name, template) = parse_macro_definition(&form)?;
        if !names_seen.insert(name.clone()) {
            return Err(err_msg!(Macro, "macro '{}' is defined more than once", name));
        }
        macros.push((name, template));
    }
    Ok((macros, rest))
}

/// True for forms headed by `defmacro`.
pub fn is_macro_definition(form: &Node) -> bool {
    form.head_symbol() == Some("defmacro")
}

/// Parses `(defmacro name [a b #* rest] body...)`.
///
/// Several body forms are wrapped in `do`.
pub fn parse_macro_definition(form: &Node) -> Result<(String, MacroTemplate), SymwalkError> {
    let items = form.as_expression().unwrap_or_default();
    let (name, params, body) = match items {
        [_, name, params, body @ ..] if !body.is_empty() => (name, params, body),
        _ => {
            return Err(err_msg!(Macro, "malformed macro definition: {}", form)
                .with_help("expected (defmacro name [params] body...)"))
        }
    };
    let Some(name) = name.as_symbol() else {
        return Err(err_msg!(Macro, "macro name must be a symbol, got {}", name.type_name()));
    };
    let Some(param_items) = params.as_sequence(SeqKind::List) else {
        return Err(err_msg!(Macro, "macro '{}' needs a bracketed parameter list", name));
    };
    let (required, rest) = parse_params(name, param_items)?;
    let body = match body {
        [single] => single.clone(),
        many => Node::call("do", many.iter().cloned()),
    };
    Ok((name.to_string(), MacroTemplate::new(required, rest, body)?))
}

fn parse_params(macro_name: &str, items: &[Node]) -> Result<(Vec<String>, Option<String>), SymwalkError> {
    let mut required = Vec::new();
    let mut rest = None;
    for (i, item) in items.iter().enumerate() {
        if let Some(name) = item.as_symbol() {
            required.push(name.to_string());
            continue;
        }
        match item.as_expression() {
            Some([op, target]) if op.as_symbol() == Some("unpack-iterable") && i + 1 == items.len() => {
                if let Some(name) = target.as_symbol() {
                    rest = Some(name.to_string());
                    continue;
                }
            }
            _ => {}
        }
        return Err(err_msg!(
            Macro,
            "invalid parameter {} in macro '{}'",
            item,
            macro_name
        )
        .with_help("parameters are symbols, optionally ending with #* rest"));
    }
    Ok((required, rest))
}

impl MacroEnv {
    /// Registers the program's `defmacro` forms as user macros and returns the
    /// remaining forms.
    pub fn load_definitions(&mut self, program: Vec<Node>) -> Result<Vec<Node>, SymwalkError> {
        let (macros, rest) = extract_macros(program)?;
        for (name, template) in macros {
            debug!(macro_name = %name, params = ?template.params, "registering template macro");
            self.user_macros.register_template(&name, template);
        }
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    #[test]
    fn parses_required_and_rest_parameters() {
        let macros = parse_macros_from_source("(defmacro m [a b #* more] (f a) (g b more))").unwrap();
        let (name, template) = &macros[0];
        assert_eq!(name, "m");
        assert_eq!(template.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(template.rest.as_deref(), Some("more"));
        assert_eq!(template.body.to_string(), "(do (f a) (g b more))");
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let err = parse_macros_from_source("(defmacro m [] 1) (defmacro m [] 2)").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Macro);
        assert!(err.message().contains("more than once"));
    }

    #[test]
    fn malformed_definitions_are_macro_errors() {
        for source in [
            "(defmacro m [])",
            "(defmacro \"m\" [] 1)",
            "(defmacro m (a) 1)",
            "(defmacro m [#* r a] 1)",
            "(defmacro m [[a 1]] a)",
        ] {
            let err = parse_macros_from_source(source).unwrap_err();
            assert_eq!(err.error_type(), ErrorType::Macro, "{}", source);
        }
    }

    #[test]
    fn load_definitions_registers_user_macros() {
        let mut env = MacroEnv::default();
        let program = parse("(defmacro m [x] x) (m 1)").unwrap();
        let rest = env.load_definitions(program).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(env.user_macros.contains("m"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_macros_from_file("/nonexistent/macros.lisp").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
    }
}
