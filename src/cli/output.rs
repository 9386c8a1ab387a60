//! Handles all user-facing output for the CLI.
//!
//! Pretty-printing, colorized trace diffs, JSON, and the `check` report all
//! live here so every command formats output the same way.

use std::io::{self, Write};
use std::path::Path;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::ast::Node;
use crate::macros::MacroExpansionStep;
use crate::SymwalkError;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints a macro expansion trace to the console with colored diffs.
pub fn print_trace(trace: &[MacroExpansionStep]) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_trace(&mut stdout, trace)
}

/// Writes each step's input, then the diff from input to output.
pub fn write_trace(out: &mut dyn WriteColor, trace: &[MacroExpansionStep]) -> io::Result<()> {
    for (i, step) in trace.iter().enumerate() {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        writeln!(out, "--- Step {}: {} ({:?}) ---", i, step.macro_name, step.provenance)?;
        out.reset()?;

        let before = step.input.to_string();
        let after = step.output.to_string();
        let changeset = Changeset::new(&before, &after, " ");
        write_diff(out, &changeset.diffs)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Prints expanded forms, one per line.
pub fn print_forms(forms: &[Node]) {
    print!("{}", crate::syntax::to_source(forms));
}

/// Prints forms as pretty JSON.
pub fn print_json(forms: &[Node]) -> Result<(), SymwalkError> {
    let json = serde_json::to_string_pretty(forms).map_err(|e| SymwalkError::Io {
        message: format!("cannot serialize tree: {}", e),
        ctx: crate::ErrorContext::none(),
        source: Some(Box::new(e)),
    })?;
    println!("{}", json);
    Ok(())
}

/// Prints one line of the `check` report.
pub fn print_check_status(path: &Path, result: &Result<usize, SymwalkError>) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    match result {
        Ok(forms) => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(stdout, "ok")?;
            stdout.reset()?;
            writeln!(stdout, "   {} ({} form(s))", path.display(), forms)
        }
        Err(err) => {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(stdout, "FAIL")?;
            stdout.reset()?;
            writeln!(stdout, " {}: {}", path.display(), err)
        }
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_diff(out: &mut dyn WriteColor, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                out.reset()?;
                write!(out, "{} ", x)?;
            }
            Difference::Add(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "+{} ", x)?;
            }
            Difference::Rem(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(out, "-{} ", x)?;
            }
        }
    }
    out.reset()
}
