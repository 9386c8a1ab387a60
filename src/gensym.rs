//! Fresh-name generation.
//!
//! `Gensym` hands out `<prefix>_<hint>_<n>` names from a single counter. Names
//! already used by the program can be reserved up front so a generated name
//! never captures, or is captured by, user code.

use std::collections::HashSet;

use crate::ast::walk::for_each_symbol;
use crate::ast::Node;

/// Counter-based generator of unique symbol names.
///
/// # Examples
///
/// ```rust
/// use symwalk::gensym::Gensym;
/// let mut names = Gensym::new("_sw");
/// assert_eq!(names.fresh("let"), "_sw_let_1");
/// assert_eq!(names.fresh("x"), "_sw_x_2");
/// ```
#[derive(Debug, Clone)]
pub struct Gensym {
    prefix: String,
    counter: usize,
    taken: HashSet<String>,
}

impl Default for Gensym {
    fn default() -> Self {
        Self::new("_sw")
    }
}

impl Gensym {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            taken: HashSet::new(),
        }
    }

    /// Marks every symbol in `program` as unavailable.
    pub fn reserve_symbols(&mut self, program: &Node) {
        for_each_symbol(program, &mut |name| self.reserve(name));
    }

    /// Marks a single name as unavailable.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Returns a name distinct from every reserved name and every earlier result.
    pub fn fresh(&mut self, hint: &str) -> String {
        let hint = sanitize_hint(hint);
        loop {
            self.counter += 1;
            let candidate = format!("{}_{}_{}", self.prefix, hint, self.counter);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

// Dotted hints would produce attribute paths.
fn sanitize_hint(hint: &str) -> String {
    let cleaned: String = hint
        .chars()
        .map(|c| if c == '.' || c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "g".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_reserved_program_names() {
        let mut names = Gensym::new("_sw");
        let program = Node::call("do", [Node::sym("_sw_let_1"), Node::sym("_sw_let_2")]);
        names.reserve_symbols(&program);
        assert_eq!(names.fresh("let"), "_sw_let_3");
    }

    #[test]
    fn hints_never_produce_dotted_names() {
        let mut names = Gensym::new("_g");
        assert_eq!(names.fresh("a.b"), "_g_a_b_1");
        assert_eq!(names.fresh(""), "_g_g_2");
    }

    #[test]
    fn results_never_repeat() {
        let mut names = Gensym::default();
        let generated: HashSet<String> = (0..50).map(|_| names.fresh("x")).collect();
        assert_eq!(generated.len(), 50);
    }
}
