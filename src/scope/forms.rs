//! Special-form dispatch table.
//!
//! Maps a head symbol to the rule the substitution engine applies to the form.
//! Every reserved word gets the generic `Special` rule first, then the forms
//! with binding or quotation semantics overwrite their own entries, so a
//! generic entry can never shadow a specific one.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// How the substitution engine treats a form, keyed by its head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    /// `quote`: never descended into.
    Quote,
    /// Compile-time-only forms (`require`, `import`, ...): never descended into.
    Opaque,
    /// `quasiquote`: raises the quotation depth.
    Quasiquote,
    /// `unquote`, `unquote-splice`: lowers the quotation depth.
    Unquote,
    /// `global`, `nonlocal`: protects the declared names for the rest of the region.
    Declaration,
    /// `except` clauses, which may bind the exception to a name.
    Except,
    /// `(. obj attr ...)` attribute access.
    Dot,
    /// `defclass`: the class name is not a reference.
    DefClass,
    /// `match`: patterns bind names per clause.
    Match,
    /// `fn`: parameters bind names for the body.
    Fn,
    /// `defn`: like `fn`, plus a declared name and decorators.
    Defn,
    /// Any other reserved word: head kept, tail traversed.
    Special,
}

/// Reserved heads of the target language, including its operators.
pub const SPECIAL_FORMS: &[&str] = &[
    ".", ",", "and", "annotate", "assert", "await", "break", "chainc", "continue", "cut",
    "defclass", "defmacro", "defn", "deftype", "del", "dfor", "do", "else", "eval-and-compile",
    "eval-when-compile", "except", "except*", "finally", "fn", "for", "get", "gfor", "global",
    "if", "import", "in", "is", "is-not", "let", "lfor", "match", "nonlocal", "not", "not-in",
    "or", "py", "pys", "quasiquote", "quote", "raise", "require", "return", "setv", "setx",
    "sfor", "smacrolet", "try", "unpack-iterable", "unpack-mapping", "unquote",
    "unquote-splice", "while", "with", "yield", "yield-from",
    // operators
    "+", "-", "*", "**", "/", "//", "%", "@", "<<", ">>", "&", "|", "^", "~", "<", ">", "<=",
    ">=", "=", "!=", "+=", "-=", "*=", "**=", "/=", "//=", "%=", "@=", "<<=", ">>=", "&=",
    "|=", "^=",
];

static FORM_TABLE: Lazy<HashMap<&'static str, FormKind>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, FormKind> =
        SPECIAL_FORMS.iter().map(|name| (*name, FormKind::Special)).collect();
    let specific = [
        ("quote", FormKind::Quote),
        ("require", FormKind::Opaque),
        ("import", FormKind::Opaque),
        ("defmacro", FormKind::Opaque),
        ("eval-when-compile", FormKind::Opaque),
        ("quasiquote", FormKind::Quasiquote),
        ("unquote", FormKind::Unquote),
        ("unquote-splice", FormKind::Unquote),
        ("global", FormKind::Declaration),
        ("nonlocal", FormKind::Declaration),
        ("except", FormKind::Except),
        ("except*", FormKind::Except),
        (".", FormKind::Dot),
        ("defclass", FormKind::DefClass),
        ("match", FormKind::Match),
        ("fn", FormKind::Fn),
        ("defn", FormKind::Defn),
    ];
    table.extend(specific);
    table
});

/// Looks up the rule for a head symbol. `None` means an ordinary call.
pub fn classify(head: &str) -> Option<FormKind> {
    FORM_TABLE.get(head).copied()
}
