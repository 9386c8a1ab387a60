//!
//! ****************************************************************************************
//! ** ERROR CONSTRUCTION RULES FOR symwalk Error Macros (`err_msg!`, `err_ctx!`)         **
//! ****************************************************************************************
//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic type for the crate. Every
//! failure produced by reading, macro expansion, symbol substitution, `let` compilation,
//! or configuration loading is a `SymwalkError`.
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(MalformedBindings, "let bindings must be paired, got {} forms", n)`
//!
//! - **Use `err_ctx!` when a source text and span are available.**
//!   - `err_ctx!(Parse, "expected ')'", src, span)`
//!
//! # Rules
//!
//! - Pass `src` as a `SourceArc` and `span` as a `Span`; the macro clones the source.
//! - Attach help text with `.with_help(..)` instead of building `ErrorContext` by hand.
//! - Expansion errors are never caught and retried. They propagate unchanged to the
//!   top-level caller, which reports them as build-time diagnostics.
//!
//! ****************************************************************************************

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Type aliases for clarity and brevity
pub type SourceArc = Arc<NamedSource<String>>;
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Byte range in a source text, used for labels on reader errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Type-safe error classification enum that corresponds to `SymwalkError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Reader errors: unmatched delimiters, bad literals
    Parse,
    /// Odd number of forms in a binding list
    MalformedBindings,
    /// Bind target that is neither a name nor a destructuring pattern
    InvalidBindTarget,
    /// Bind target containing an attribute path
    IllegalDottedTarget,
    /// Destructuring into a mapping, set, or call-shaped target
    UnsupportedDestructureShape,
    /// Unquote with no enclosing quasiquote
    QuotationUnderflow,
    /// Failure raised while invoking a macro
    Macro,
    /// Transitive expansion exceeded the configured limit
    RecursionLimit,
    /// Invalid configuration
    Config,
    /// File system failures
    Io,
}

impl ErrorType {
    /// Returns the stable name used in diagnostic codes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Parse => "parse",
            ErrorType::MalformedBindings => "malformed_bindings",
            ErrorType::InvalidBindTarget => "invalid_bind_target",
            ErrorType::IllegalDottedTarget => "illegal_dotted_target",
            ErrorType::UnsupportedDestructureShape => "unsupported_destructure_shape",
            ErrorType::QuotationUnderflow => "quotation_underflow",
            ErrorType::Macro => "macro",
            ErrorType::RecursionLimit => "recursion_limit",
            ErrorType::Config => "config",
            ErrorType::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The primary source for this error (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for every symwalk failure mode.
#[derive(Debug, Error)]
pub enum SymwalkError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Malformed bindings: {message}")]
    MalformedBindings {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Invalid bind target: {message}")]
    InvalidBindTarget {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Illegal dotted target: {message}")]
    IllegalDottedTarget {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Unsupported destructuring shape: {message}")]
    UnsupportedDestructureShape {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Unquote outside quotation: {message}")]
    QuotationUnderflow {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Macro error: {message}")]
    Macro {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Recursion limit exceeded: {message}")]
    RecursionLimit {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<BoxedCause>,
    },
}

impl SymwalkError {
    fn parts(&self) -> (&String, &ErrorContext) {
        match self {
            SymwalkError::Parse { message, ctx, .. }
            | SymwalkError::MalformedBindings { message, ctx, .. }
            | SymwalkError::InvalidBindTarget { message, ctx, .. }
            | SymwalkError::IllegalDottedTarget { message, ctx, .. }
            | SymwalkError::UnsupportedDestructureShape { message, ctx, .. }
            | SymwalkError::QuotationUnderflow { message, ctx, .. }
            | SymwalkError::Macro { message, ctx, .. }
            | SymwalkError::RecursionLimit { message, ctx, .. }
            | SymwalkError::Config { message, ctx, .. }
            | SymwalkError::Io { message, ctx, .. } => (message, ctx),
        }
    }

    fn ctx_mut(&mut self) -> &mut ErrorContext {
        match self {
            SymwalkError::Parse { ctx, .. }
            | SymwalkError::MalformedBindings { ctx, .. }
            | SymwalkError::InvalidBindTarget { ctx, .. }
            | SymwalkError::IllegalDottedTarget { ctx, .. }
            | SymwalkError::UnsupportedDestructureShape { ctx, .. }
            | SymwalkError::QuotationUnderflow { ctx, .. }
            | SymwalkError::Macro { ctx, .. }
            | SymwalkError::RecursionLimit { ctx, .. }
            | SymwalkError::Config { ctx, .. }
            | SymwalkError::Io { ctx, .. } => ctx,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            SymwalkError::Parse { .. } => ErrorType::Parse,
            SymwalkError::MalformedBindings { .. } => ErrorType::MalformedBindings,
            SymwalkError::InvalidBindTarget { .. } => ErrorType::InvalidBindTarget,
            SymwalkError::IllegalDottedTarget { .. } => ErrorType::IllegalDottedTarget,
            SymwalkError::UnsupportedDestructureShape { .. } => {
                ErrorType::UnsupportedDestructureShape
            }
            SymwalkError::QuotationUnderflow { .. } => ErrorType::QuotationUnderflow,
            SymwalkError::Macro { .. } => ErrorType::Macro,
            SymwalkError::RecursionLimit { .. } => ErrorType::RecursionLimit,
            SymwalkError::Config { .. } => ErrorType::Config,
            SymwalkError::Io { .. } => ErrorType::Io,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// Attaches a help message, replacing any previous one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.ctx_mut().help = Some(help.into());
        self
    }

    /// Attaches the source text the error refers to.
    pub fn with_source(mut self, source: SourceArc) -> Self {
        self.ctx_mut().source = Some(source);
        self
    }
}

impl Diagnostic for SymwalkError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("symwalk::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        let span = ctx.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(message.clone()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

impl From<std::io::Error> for SymwalkError {
    fn from(err: std::io::Error) -> Self {
        SymwalkError::Io {
            message: err.to_string(),
            ctx: ErrorContext::none(),
            source: Some(Box::new(err)),
        }
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a `SymwalkError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($fmt:tt)+) => {
        $crate::SymwalkError::$variant {
            message: format!($($fmt)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a `SymwalkError` variant with a message, a source, and a span.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::SymwalkError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn report_includes_code_label_and_help() {
        let src = to_error_source("demo.lisp", "(let [a] a)");
        let err = err_ctx!(MalformedBindings, "odd binding list", &src, Span { start: 5, end: 8 })
            .with_help("bindings come in name/value pairs");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("symwalk::malformed_bindings"));
        assert!(output.contains("odd binding list"));
        assert!(output.contains("bindings come in name/value pairs"));
    }

    #[test]
    fn err_msg_formats_arguments() {
        let err = err_msg!(IllegalDottedTarget, "'{}' is an attribute path", "a.b");
        assert_eq!(err.error_type(), ErrorType::IllegalDottedTarget);
        assert_eq!(err.message(), "'a.b' is an attribute path");
        assert_eq!(err.to_string(), "Illegal dotted target: 'a.b' is an attribute path");
    }

    #[test]
    fn io_errors_convert_with_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SymwalkError = io.into();
        assert_eq!(err.error_type(), ErrorType::Io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
