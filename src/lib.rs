//! Unicode MessageFormat 2.0: parse, validate, and resolve MF2 messages
//! into formatted strings or structured parts.
//!
//! ```
//! use messageformat2::MessageFormat;
//!
//! let mf = MessageFormat::new("Hello, {$name}!", Default::default()).unwrap();
//! let mut args = std::collections::HashMap::new();
//! args.insert("name".to_string(), messageformat2::RuntimeValue::String("World".into()));
//! assert_eq!(mf.format(&args), "Hello, World!");
//! ```
//!
//! # Extending the formatter
//!
//! Host applications can register additional message functions with
//! [`MessageFormatOptions`]:
//!
//! ```rust,ignore
//! use messageformat2::{MessageFormat, MessageFormatOptions};
//! use std::sync::Arc;
//!
//! let options = MessageFormatOptions::new()
//!     .with_function("custom", Arc::new(my_custom_fn));
//! let mf = MessageFormat::new(source, options)?;
//! ```

pub mod cst;
pub mod errors;
pub mod formatter;
pub mod locale;
pub mod model;
pub mod options;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod scope;
pub mod selector;
pub mod span;
pub mod token;
pub mod validate;
pub mod value;

pub use errors::{CollectingSink, CompileError, ErrorSink, NullSink, ParseError, ParseErrorKind, ResolutionError, ValidationError};
pub use locale::LocaleMatcher;
pub use options::{BidiIsolation, MessageFormatOptions, ResolvedOptions};
pub use registry::{FunctionContext, FunctionError, FunctionRegistry, MessageFunction};
pub use value::{Direction, MessagePart, MessageValue, RuntimeValue};

use model::Message;
use resolver::Resolver;
use scope::Scope;
use std::collections::HashMap;

/// A compiled MF2 message, ready to be formatted against any number of
/// argument maps.
pub struct MessageFormat {
    source: String,
    message: Message,
    options: options::MessageFormatOptions,
    resolved_locale: String,
    message_direction: Direction,
    parse_warnings: Vec<ParseError>,
}

impl MessageFormat {
    /// Parse, lower, and validate `source`, refusing to build an instance
    /// only if a *fatal* syntax error leaves some part of the source with
    /// no Data Model representation, or if validation fails. Recoverable
    /// parse errors (a duplicate option name, a bad escape, ...) still let
    /// construction succeed; they're attached to the returned instance
    /// and readable via [`Self::parse_warnings`], per §7's propagation
    /// policy.
    pub fn new(source: &str, options: MessageFormatOptions) -> Result<Self, CompileError> {
        let (cst, parse_errors) = parser::parse_with_mode(source, options.resource_mode);
        let (fatal, warnings): (Vec<_>, Vec<_>) = parse_errors.into_iter().partition(|e| e.kind.is_fatal());
        if !fatal.is_empty() {
            return Err(CompileError { parse_errors: fatal, validation_errors: Vec::new() });
        }
        let message = model::lower(source, &cst).map_err(|parse_errors| CompileError {
            parse_errors,
            validation_errors: Vec::new(),
        })?;
        let validation_errors = validate::validate(&message);
        if !validation_errors.is_empty() {
            return Err(CompileError { parse_errors: Vec::new(), validation_errors });
        }
        let mut mf = Self::from_message(source, message, options);
        mf.parse_warnings = warnings;
        Ok(mf)
    }

    /// Build an instance from an already-lowered, already-validated
    /// [`Message`] — the escape hatch for tooling (linters, editors) that
    /// builds its own Data Model and wants the formatting machinery
    /// without re-parsing.
    pub fn from_message(source: &str, message: Message, options: MessageFormatOptions) -> Self {
        let known: Vec<String> = locale::KNOWN_LOCALES.iter().map(|s| s.to_string()).collect();
        let resolved_locale = locale::negotiate(&options.locales, &known, options.locale_matcher);
        let message_direction = options.direction.unwrap_or_else(|| registry::direction_from_locale(&resolved_locale));
        MessageFormat { source: source.to_string(), message, options, resolved_locale, message_direction, parse_warnings: Vec::new() }
    }

    /// Recoverable parse errors attached at construction time (empty if
    /// the source parsed cleanly, or if this instance was built via
    /// [`Self::from_message`]).
    pub fn parse_warnings(&self) -> &[ParseError] {
        &self.parse_warnings
    }

    /// Parse and lower `source` without validating it, collecting every
    /// parse/lowering error instead of refusing to build. The returned [`Message`] may be structurally invalid;
    /// callers that plan to format it should still call
    /// [`validate::validate`] themselves if they care.
    pub fn parse_to_model(source: &str) -> (Option<Message>, Vec<ParseError>) {
        let (cst, mut parse_errors) = parser::parse(source);
        match model::lower(source, &cst) {
            Ok(message) => (Some(message), parse_errors),
            Err(lowering_errors) => {
                parse_errors.extend(lowering_errors);
                (None, parse_errors)
            }
        }
    }

    /// Format against `args`, discarding any resolution errors — an
    /// infallible `format()` where failures degrade to fallback text
    /// rather than propagating.
    pub fn format(&self, args: &HashMap<String, RuntimeValue>) -> String {
        let mut sink = NullSink;
        formatter::concatenate(&self.format_to_parts_with_sink(args, &mut sink))
    }

    /// Format against `args`, reporting every [`ResolutionError`] via
    /// `sink` as it's produced.
    pub fn format_with_errors(&self, args: &HashMap<String, RuntimeValue>, sink: &mut dyn ErrorSink) -> String {
        formatter::concatenate(&self.format_to_parts_with_sink(args, sink))
    }

    /// Format to the structured [`MessagePart`] list, discarding
    /// resolution errors.
    pub fn format_to_parts(&self, args: &HashMap<String, RuntimeValue>) -> Vec<MessagePart> {
        let mut sink = NullSink;
        self.format_to_parts_with_sink(args, &mut sink)
    }

    /// Format to the structured [`MessagePart`] list, reporting every
    /// resolution error via `sink`.
    pub fn format_to_parts_with_sink(&self, args: &HashMap<String, RuntimeValue>, sink: &mut dyn ErrorSink) -> Vec<MessagePart> {
        let scope = Scope::new(args, self.message.declarations());
        let locales = vec![self.resolved_locale.clone()];
        let resolver = Resolver::new(&self.source, &self.options.functions, &locales, self.message_direction);

        let pattern = match &self.message {
            Message::Pattern(m) => m.pattern.clone(),
            Message::Select(m) => self.select_pattern(m, &scope, &resolver, sink),
        };

        formatter::format_to_parts(&resolver, &scope, &pattern, self.message_direction, self.options.bidi_isolation, sink)
    }

    fn select_pattern(&self, m: &model::SelectMessage, scope: &Scope, resolver: &Resolver, sink: &mut dyn ErrorSink) -> model::Pattern {
        let candidates: Vec<Vec<String>> = m
            .selectors
            .iter()
            .map(|selector_expr| {
                let value = resolver.resolve_expression(scope, selector_expr, sink);
                value.selector_keys.unwrap_or_default()
            })
            .collect();

        match selector::select(&candidates, &m.variants) {
            Some(index) => m.variants[index].pattern.clone(),
            None => {
                sink.report(ResolutionError::NoMatch);
                model::Pattern::default()
            }
        }
    }

    /// The options actually in force for this instance, with negotiation
    /// and direction-derivation ambiguity resolved.
    pub fn resolved_options(&self) -> ResolvedOptions {
        let mut function_names = self.options.functions.names();
        function_names.sort();
        ResolvedOptions {
            locales: vec![self.resolved_locale.clone()],
            bidi_isolation: self.options.bidi_isolation,
            direction: self.message_direction,
            locale_matcher: self.options.locale_matcher,
            function_names,
        }
    }
}
