//! Defines the command-line arguments and subcommands for the symwalk CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "symwalk",
    version,
    about = "Macro expansion, hygienic symbol substitution, and lexical let for Lisp-family code."
)]
pub struct SymwalkArgs {
    /// YAML settings file; defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every top-level form fully expanded.
    Expand {
        /// The source file to expand.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show a stepwise macro expansion trace with diffs.
    Trace {
        /// The source file to trace.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Print the parsed code tree as JSON.
    Ast {
        /// The source file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Expand every source file under a directory and report failures.
    Check {
        /// The directory to scan.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}
