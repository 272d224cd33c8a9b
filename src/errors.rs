//! The error taxonomy: parse, validation, and resolution errors.
//!
//! `seq-compiler`'s own `Parser`/`Resolver` return bare `Result<T, String>`
//! (see `parser.rs`'s `format!("Expected '{{' after union name '{}'...")`
//! style). A library whose callers need to match on error *kind* — not
//! just read a message — needs more than a string, so these are small
//! enums with hand-written `Display` impls in the same terse register,
//! rather than reaching for a derive-macro error crate nothing in this
//! pack uses for a crate shaped like this one.

use crate::span::Span;
use std::fmt;

/// A parser error: always carries the span of the offending source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingSyntax { expected: String },
    ExtraContent,
    EmptyToken,
    BadEscape,
    BadInputExpression { reason: String },
    DuplicateOptionName { name: String },
    ParseError { message: String },
}

impl ParseErrorKind {
    /// Whether this error leaves a portion of the source with no Data
    /// Model representation at all — per §7, every other kind here
    /// recovers within parsing (a synthesized token, a skipped option, a
    /// kept-as-is escape sequence) and still lowers to a complete
    /// message, so only the catchall "could not make any sense of this"
    /// case is fatal to construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseErrorKind::ParseError { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::MissingSyntax { expected } => {
                write!(f, "missing-syntax: expected {expected} at {}..{}", self.span.start, self.span.end)
            }
            ParseErrorKind::ExtraContent => {
                write!(f, "extra-content at {}..{}", self.span.start, self.span.end)
            }
            ParseErrorKind::EmptyToken => {
                write!(f, "empty-token at {}..{}", self.span.start, self.span.end)
            }
            ParseErrorKind::BadEscape => {
                write!(f, "bad-escape at {}..{}", self.span.start, self.span.end)
            }
            ParseErrorKind::BadInputExpression { reason } => {
                write!(f, "bad-input-expression: {reason}")
            }
            ParseErrorKind::DuplicateOptionName { name } => {
                write!(f, "duplicate-option-name: '{name}' at {}..{}", self.span.start, self.span.end)
            }
            ParseErrorKind::ParseError { message } => write!(f, "parse-error: {message}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A validation error, produced by `validate.rs` from a lowered Data Model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingSelectorAnnotation { selector: String },
    DuplicateLocalDeclaration { name: String },
    RedeclaredInput { name: String },
    VariantArityMismatch { expected: usize, found: usize },
    MissingFallbackVariant,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingSelectorAnnotation { selector } => {
                write!(f, "missing-selector-annotation: ${selector} has no function annotation usable for selection")
            }
            ValidationError::DuplicateLocalDeclaration { name } => {
                write!(f, "duplicate local declaration: ${name}")
            }
            ValidationError::RedeclaredInput { name } => {
                write!(f, "redeclared input: ${name}")
            }
            ValidationError::VariantArityMismatch { expected, found } => {
                write!(f, "variant has {found} keys, expected {expected}")
            }
            ValidationError::MissingFallbackVariant => {
                write!(f, "no variant uses the all-catchall key tuple; selection may fail with no-match")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Runtime errors raised during `format`/`format_to_parts`. These never
/// abort formatting — every variant is converted to a fallback part and
/// reported via the error sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    UnresolvedVariable { name: String, source: String },
    UnknownFunction { name: String, source: String },
    BadOperand { function: String, reason: String, source: String },
    BadOption { function: String, option: String, reason: String, source: String },
    CyclicDeclaration { name: String },
    NoMatch,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::UnresolvedVariable { name, .. } => {
                write!(f, "unresolved-variable: ${name}")
            }
            ResolutionError::UnknownFunction { name, .. } => {
                write!(f, "unknown-function: {name}")
            }
            ResolutionError::BadOperand { function, reason, .. } => {
                write!(f, "bad-operand: {function}: {reason}")
            }
            ResolutionError::BadOption { function, option, reason, .. } => {
                write!(f, "bad-option: {function} option '{option}': {reason}")
            }
            ResolutionError::CyclicDeclaration { name } => {
                write!(f, "cyclic-declaration: ${name}")
            }
            ResolutionError::NoMatch => write!(f, "no-match"),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// The source slice a `ResolutionError` should be rendered from, when
/// building a fallback.
impl ResolutionError {
    pub fn fallback_source(&self) -> Option<&str> {
        match self {
            ResolutionError::UnresolvedVariable { source, .. } => Some(source),
            ResolutionError::UnknownFunction { source, .. } => Some(source),
            ResolutionError::BadOperand { source, .. } => Some(source),
            ResolutionError::BadOption { source, .. } => Some(source),
            ResolutionError::CyclicDeclaration { .. } | ResolutionError::NoMatch => None,
        }
    }
}

/// Error raised at construction time when the source has one or more
/// *fatal* (unrecoverable) syntax errors and the caller didn't ask for a
/// tolerant parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub parse_errors: Vec<ParseError>,
    pub validation_errors: Vec<ValidationError>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} parse error(s), {} validation error(s)",
            self.parse_errors.len(),
            self.validation_errors.len()
        )
    }
}

impl std::error::Error for CompileError {}

/// Sink for errors reported during a single `format`/`format_to_parts`
/// call. The default sink (`format`'s no-callback path) discards events
/// silently but still returns a usable string.
pub trait ErrorSink {
    fn report(&mut self, error: ResolutionError);
}

impl<F: FnMut(ResolutionError)> ErrorSink for F {
    fn report(&mut self, error: ResolutionError) {
        self(error)
    }
}

/// An [`ErrorSink`] that collects every event for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub errors: Vec<ResolutionError>,
}

impl ErrorSink for CollectingSink {
    fn report(&mut self, error: ResolutionError) {
        self.errors.push(error);
    }
}

/// An [`ErrorSink`] that discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl ErrorSink for NullSink {
    fn report(&mut self, _error: ResolutionError) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_records_errors_in_order() {
        let mut sink = CollectingSink::default();
        sink.report(ResolutionError::UnknownFunction { name: "foo".into(), source: "{:foo}".into() });
        sink.report(ResolutionError::NoMatch);
        assert_eq!(sink.errors.len(), 2);
        assert!(matches!(sink.errors[0], ResolutionError::UnknownFunction { .. }));
    }

    #[test]
    fn fallback_source_is_none_for_structural_errors() {
        assert_eq!(ResolutionError::NoMatch.fallback_source(), None);
    }
}
