//! Reader - converts source text into code trees.
//!
//! Purely syntactic: reader prefixes become ordinary two-element expressions
//! and dotted symbols stay symbols. Spans are only kept long enough to label
//! reader errors.

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::{Literal, Node, SeqKind};
use crate::diagnostics::{to_error_source, SourceArc};
use crate::{err_ctx, Span, SymwalkError};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SymwalkParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Reads every top-level form in `source`.
///
/// # Examples
///
/// ```rust
/// use symwalk::syntax::parse;
/// let forms = parse("(print 'x) ; comment\n[1 2.5 :k \"s\"]").unwrap();
/// assert_eq!(forms.len(), 2);
/// assert_eq!(forms[0].to_string(), "(print (quote x))");
/// ```
pub fn parse(source: &str) -> Result<Vec<Node>, SymwalkError> {
    parse_named("<input>", source)
}

/// Like [`parse`], naming the source in diagnostics.
pub fn parse_named(name: &str, source: &str) -> Result<Vec<Node>, SymwalkError> {
    let src = to_error_source(name, source);
    let mut pairs = SymwalkParser::parse(Rule::program, source)
        .map_err(|e| convert_parse_error(e, &src))?;
    let Some(program) = pairs.next() else {
        return Ok(vec![]);
    };
    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| build_node(p, &src))
        .collect()
}

/// Reads a source text holding exactly one form.
pub fn parse_one(source: &str) -> Result<Node, SymwalkError> {
    let mut forms = parse(source)?;
    if forms.len() != 1 {
        let src = to_error_source("<input>", source);
        let span = Span {
            start: 0,
            end: source.len(),
        };
        return Err(err_ctx!(
            Parse,
            format!("expected exactly one form, found {}", forms.len()),
            &src,
            span
        ));
    }
    Ok(forms.remove(0))
}

// ============================================================================
// TREE BUILDERS
// ============================================================================

fn build_node(pair: Pair<Rule>, src: &SourceArc) -> Result<Node, SymwalkError> {
    let span = get_span(&pair);
    match pair.as_rule() {
        Rule::quote => build_prefixed("quote", pair, src),
        Rule::quasiquote => build_prefixed("quasiquote", pair, src),
        Rule::unquote => build_prefixed("unquote", pair, src),
        Rule::unquote_splice => build_prefixed("unquote-splice", pair, src),
        Rule::unpack_iterable => build_prefixed("unpack-iterable", pair, src),
        Rule::unpack_mapping => build_prefixed("unpack-mapping", pair, src),

        Rule::expression => Ok(Node::Expression(build_children(pair, src)?)),
        Rule::list => Ok(Node::Sequence(SeqKind::List, build_children(pair, src)?)),
        Rule::tuple => Ok(Node::Sequence(SeqKind::Tuple, build_children(pair, src)?)),
        Rule::set => Ok(Node::Sequence(SeqKind::Set, build_children(pair, src)?)),
        Rule::dict => {
            let items = build_children(pair, src)?;
            if items.len() % 2 != 0 {
                return Err(err_ctx!(
                    Parse,
                    "dict literal needs an even number of forms",
                    src,
                    span
                ));
            }
            Ok(Node::Sequence(SeqKind::Dict, items))
        }

        Rule::string => {
            let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Node::Atom(Literal::String(unescape_string(inner))))
        }
        Rule::keyword => Ok(Node::keyword(&pair.as_str()[1..])),
        Rule::integer => {
            let text = pair.as_str();
            let value = text.parse::<i64>().map_err(|_| {
                err_ctx!(Parse, format!("integer literal {} is out of range", text), src, span)
            })?;
            Ok(Node::int(value))
        }
        Rule::float => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|_| {
                err_ctx!(Parse, format!("invalid float literal {}", text), src, span)
            })?;
            Ok(Node::Atom(Literal::Float(value)))
        }
        Rule::symbol => Ok(Node::sym(pair.as_str())),

        rule => Err(err_ctx!(Parse, format!("unexpected {:?}", rule), src, span)),
    }
}

fn build_children(pair: Pair<Rule>, src: &SourceArc) -> Result<Vec<Node>, SymwalkError> {
    pair.into_inner().map(|p| build_node(p, src)).collect()
}

// 'x => (quote x)
fn build_prefixed(head: &str, pair: Pair<Rule>, src: &SourceArc) -> Result<Node, SymwalkError> {
    let span = get_span(&pair);
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| err_ctx!(Parse, format!("expected a form after {}", head), src, span))?;
    Ok(Node::call(head, [build_node(inner, src)?]))
}

// ============================================================================
// UTILITIES
// ============================================================================

fn get_span(pair: &Pair<Rule>) -> Span {
    Span {
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    }
}

fn unescape_string(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: pest::error::Error<Rule>, src: &SourceArc) -> SymwalkError {
    let span = match error.location {
        InputLocation::Pos(pos) => Span { start: pos, end: pos },
        InputLocation::Span((start, end)) => Span { start, end },
    };
    let rendered = error.variant.message();
    let message = if rendered.contains("EOI") || rendered.contains("form") {
        "unbalanced delimiter or unreadable form"
    } else {
        "syntax error"
    };
    err_ctx!(Parse, message, src, span).with_help(rendered.to_string())
}
