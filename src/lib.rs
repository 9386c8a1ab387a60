pub use crate::diagnostics::{ErrorContext, ErrorType, Span, SymwalkError};

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod gensym;
pub mod lexical;
pub mod macros;
pub mod scope;
pub mod syntax;
