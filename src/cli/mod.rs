//! The symwalk command-line interface.
//!
//! This module is the entry point for all CLI commands and orchestrates the
//! library: read, load `defmacro` definitions, expand, print.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use miette::Report;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::ast::Node;
use crate::cli::args::{Command, SymwalkArgs};
use crate::config::ExpandConfig;
use crate::diagnostics::to_error_source;
use crate::macros::{expand_all, MacroEnv};
use crate::syntax::parse_named;
use crate::{err_msg, SymwalkError};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = SymwalkArgs::parse();
    init_tracing(args.verbose);

    let result = ExpandConfig::load_or_default(args.config.as_deref())
        .and_then(|config| dispatch(args.command, &config));

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{:?}", Report::new(e));
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("symwalk=debug"),
        _ => EnvFilter::new("symwalk=trace"),
    };
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Returns Ok(false) when the command ran but found failures.
fn dispatch(command: Command, config: &ExpandConfig) -> Result<bool, SymwalkError> {
    match command {
        Command::Expand { file } => {
            let (forms, _env) = expand_file(&file, config)?;
            output::print_forms(&forms);
            Ok(true)
        }
        Command::Trace { file } => {
            let (_forms, env) = expand_file(&file, config)?;
            output::print_trace(env.trace())?;
            Ok(true)
        }
        Command::Ast { file } => {
            let source = fs::read_to_string(&file)?;
            let forms = parse_named(&file.display().to_string(), &source)?;
            output::print_json(&forms)?;
            Ok(true)
        }
        Command::Check { path } => handle_check(&path, config),
    }
}

fn handle_check(root: &Path, config: &ExpandConfig) -> Result<bool, SymwalkError> {
    let files = discover_source_files(root, &config.source_extension)?;
    info!(count = files.len(), root = %root.display(), "checking source files");
    let mut failures = 0;
    for file in &files {
        let result = expand_file(file, config).map(|(forms, _)| forms.len());
        if result.is_err() {
            failures += 1;
        }
        output::print_check_status(file, &result)?;
    }
    println!("{} file(s) checked, {} failed", files.len(), failures);
    Ok(failures == 0)
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Reads a file and expands it with [`expand_source`].
pub fn expand_file(path: &Path, config: &ExpandConfig) -> Result<(Vec<Node>, MacroEnv), SymwalkError> {
    let source = fs::read_to_string(path).map_err(|e| {
        SymwalkError::from(e).with_help(format!("could not read {}", path.display()))
    })?;
    expand_source(&path.display().to_string(), &source, config)
}

/// Parses `source`, registers its `defmacro` forms, and expands the rest.
///
/// Every symbol in the program is reserved before expansion so generated
/// names never collide with the program's own.
///
/// # Examples
///
/// ```rust
/// use symwalk::cli::expand_source;
/// use symwalk::config::ExpandConfig;
///
/// let source = "(defmacro swap [a b] #(b a)) (swap 1 2)";
/// let (forms, env) = expand_source("demo", source, &ExpandConfig::default()).unwrap();
/// assert_eq!(forms[0].to_string(), "#(2 1)");
/// assert!(env.user_macros.contains("swap"));
/// ```
pub fn expand_source(
    name: &str,
    source: &str,
    config: &ExpandConfig,
) -> Result<(Vec<Node>, MacroEnv), SymwalkError> {
    let program = parse_named(name, source)?;
    let mut env = MacroEnv::for_program(config.clone(), &program);
    let forms = env.load_definitions(program)?;
    debug!(file = name, forms = forms.len(), "expanding program");

    let src = to_error_source(name, source);
    let expanded = forms
        .iter()
        .map(|form| expand_all(form, &mut env))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.with_source(src))?;
    Ok((expanded, env))
}

/// Recursively finds files with the given extension, sorted by path.
pub fn discover_source_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, SymwalkError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| err_msg!(Io, "failed to walk directory: {}", e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}
