//! Reading and printing source text.
//!
//! The printer is `Display` on [`Node`]; it emits the canonical long form
//! (`(quote x)` rather than `'x`), which reads back as an equal tree.

use crate::ast::Node;

pub mod parser;

pub use parser::{parse, parse_named, parse_one};

/// Prints top-level forms one per line.
pub fn to_source(forms: &[Node]) -> String {
    forms
        .iter()
        .map(|form| format!("{}\n", form))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printed_program_reads_back_equal() {
        let source = r#"(defn f [a #* r] `(a ~@r)) #{1 2.0} {"k\n" :v} #(x.y ,) (. obj (m 1))"#;
        let forms = parse(source).unwrap();
        let printed = to_source(&forms);
        assert_eq!(parse(&printed).unwrap(), forms);
    }
}
