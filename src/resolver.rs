//! Expression resolution: turns a Data Model [`Expression`]
//! plus a [`Scope`] into a [`MessageValue`], never throwing — every
//! failure becomes a fallback value and an [`ResolutionError`] reported to
//! the caller's [`ErrorSink`].
//!
//! Grounded on `seq-compiler`'s `Resolver` in its overall "resolve and merge
//! a graph, tracking what's in progress" shape; the graph here is
//! declarations referencing each other through variable names rather than
//! files referencing each other through `include`.

use crate::errors::{ErrorSink, ResolutionError};
use crate::model::{Annotation, Declaration, Expression, InputDeclaration, Literal, Operand};
use crate::registry::{FunctionContext, FunctionRegistry};
use crate::scope::{Check, Scope};
use crate::span::Span;
use crate::value::{Direction, MessagePart, MessageValue, OptionsMap, ResolvedValue, RuntimeValue};
use std::collections::BTreeMap;

pub struct Resolver<'a> {
    source: &'a str,
    registry: &'a FunctionRegistry,
    locales: &'a [String],
    message_direction: Direction,
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a str, registry: &'a FunctionRegistry, locales: &'a [String], message_direction: Direction) -> Self {
        Resolver { source, registry, locales, message_direction }
    }

    /// Resolve a full expression.
    pub fn resolve_expression(&self, scope: &Scope, expr: &Expression, sink: &mut dyn ErrorSink) -> MessageValue {
        let operand = match &expr.arg {
            None => None,
            Some(Operand::Literal(Literal::Text(s))) => Some(ResolvedValue::Runtime(RuntimeValue::String(s.clone()))),
            Some(Operand::Variable(v)) => match self.resolve_variable(scope, &v.name, v.source, sink) {
                Ok(value) => Some(value),
                Err(fallback) => return fallback,
            },
        };
        self.resolve_annotation(scope, expr, operand, sink)
    }

    /// Force an `.input` declaration's thunk: its operand is always the
    /// caller's raw argument for `name` — resolved directly
    /// from the argument map rather than recursing through
    /// [`Self::resolve_variable`], which would see the thunk it is itself
    /// still computing and report a spurious cycle.
    fn resolve_input(&self, scope: &Scope, name: &str, input: &InputDeclaration, sink: &mut dyn ErrorSink) -> MessageValue {
        let operand = match scope.raw_arg(name) {
            Some(raw) => Some(ResolvedValue::Runtime(raw.clone())),
            None => {
                let fallback_text = format!("{{${name}}}");
                sink.report(ResolutionError::UnresolvedVariable { name: name.to_string(), source: fallback_text.clone() });
                return MessageValue::fallback(input.expr.source, fallback_text);
            }
        };
        self.resolve_annotation(scope, &input.expr, operand, sink)
    }

    /// Resolve (and memoize) the variable bound to `name`: a declaration's
    /// thunk if one exists, otherwise a raw caller argument.
    fn resolve_variable(&self, scope: &Scope, name: &str, source: Span, sink: &mut dyn ErrorSink) -> Result<ResolvedValue, MessageValue> {
        if let Some(decl) = scope.declaration(name) {
            match scope.check(name) {
                Check::Done(value) => return Ok(ResolvedValue::Message(value)),
                Check::InProgress => {
                    sink.report(ResolutionError::CyclicDeclaration { name: name.to_string() });
                    return Err(MessageValue::fallback(source, format!("{{${name}}}")));
                }
                Check::NotStarted => {
                    scope.begin_resolving(name);
                    let value = match decl {
                        Declaration::Input(input) => self.resolve_input(scope, name, input, sink),
                        Declaration::Local(local) => self.resolve_expression(scope, &local.expr, sink),
                    };
                    scope.store_resolved(name, value.clone());
                    return Ok(ResolvedValue::Message(value));
                }
            }
        }
        if let Some(raw) = scope.raw_arg(name) {
            return Ok(ResolvedValue::Runtime(raw.clone()));
        }
        let fallback_text = format!("{{${name}}}");
        sink.report(ResolutionError::UnresolvedVariable { name: name.to_string(), source: fallback_text.clone() });
        Err(MessageValue::fallback(source, fallback_text))
    }

    /// The display string of an option/markup-attribute operand. Used
    /// where there is no enclosing expression to turn into a fallback on
    /// failure — an unresolved
    /// operand here degrades to its own `{$name}` fallback text rather
    /// than invalidating the whole markup part.
    pub fn resolve_operand_display(&self, scope: &Scope, operand: &Operand, sink: &mut dyn ErrorSink) -> String {
        match operand {
            Operand::Literal(Literal::Text(s)) => s.clone(),
            Operand::Variable(v) => match self.resolve_variable(scope, &v.name, v.source, sink) {
                Ok(value) => value.as_display_string(),
                Err(fallback) => fallback.string_value(),
            },
        }
    }

    /// Steps 2-5: resolve options, then dispatch to a function, markup, or
    /// the bare string form of the operand.
    fn resolve_annotation(&self, scope: &Scope, expr: &Expression, operand: Option<ResolvedValue>, sink: &mut dyn ErrorSink) -> MessageValue {
        let expr_source = expr.source.slice(self.source).to_string();

        match &expr.annotation {
            Some(Annotation::Function(fr)) => {
                let mut options = OptionsMap::new();
                for opt in &fr.options {
                    match &opt.value {
                        Operand::Literal(Literal::Text(s)) => {
                            options.insert(opt.name.clone(), ResolvedValue::Runtime(RuntimeValue::String(s.clone())));
                        }
                        Operand::Variable(v) => match self.resolve_variable(scope, &v.name, v.source, sink) {
                            Ok(value) => {
                                options.insert(opt.name.clone(), value);
                            }
                            Err(_) => return MessageValue::fallback(expr.source, expr_source),
                        },
                    }
                }

                match self.registry.get(&fr.name) {
                    Some(func) => {
                        let ctx = FunctionContext { locales: self.locales, source: expr.source, message_direction: self.message_direction };
                        match func.call(&ctx, &options, operand) {
                            Ok(value) => value,
                            Err(err) => {
                                match err.option {
                                    Some(option) => sink.report(ResolutionError::BadOption {
                                        function: fr.name.clone(),
                                        option,
                                        reason: err.reason,
                                        source: expr_source.clone(),
                                    }),
                                    None => sink.report(ResolutionError::BadOperand {
                                        function: fr.name.clone(),
                                        reason: err.reason,
                                        source: expr_source.clone(),
                                    }),
                                }
                                MessageValue::fallback(expr.source, expr_source)
                            }
                        }
                    }
                    None => {
                        sink.report(ResolutionError::UnknownFunction { name: fr.name.clone(), source: expr_source.clone() });
                        MessageValue::fallback(expr.source, expr_source)
                    }
                }
            }
            Some(Annotation::Markup(m)) => {
                let mut options = BTreeMap::new();
                for opt in &m.options {
                    options.insert(opt.name.clone(), self.resolve_operand_display(scope, &opt.value, sink));
                }
                MessageValue {
                    type_tag: "markup",
                    direction: Direction::Auto,
                    selector_keys: None,
                    parts: vec![MessagePart::Markup { kind: to_cst_markup_kind(m.kind), name: m.name.clone(), options }],
                    source: expr.source,
                }
            }
            None => {
                // Step 5: the string form of the resolved arg. A bare
                // operand's direction is resolved from its own content
                //, not left `auto`, so isolation wraps it
                // correctly when it mixes into a message of the other
                // direction.
                let s = operand.as_ref().map(ResolvedValue::as_display_string).unwrap_or_default();
                let direction = crate::locale::first_strong_direction(&s);
                MessageValue {
                    type_tag: "string",
                    direction,
                    selector_keys: None,
                    parts: vec![MessagePart::String(s)],
                    source: expr.source,
                }
            }
        }
    }
}

fn to_cst_markup_kind(kind: crate::model::MarkupKind) -> crate::cst::MarkupKind {
    match kind {
        crate::model::MarkupKind::Open => crate::cst::MarkupKind::Open,
        crate::model::MarkupKind::Close => crate::cst::MarkupKind::Close,
        crate::model::MarkupKind::Standalone => crate::cst::MarkupKind::Standalone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CollectingSink;
    use crate::model::{lower, Message};
    use crate::parser::parse;
    use std::collections::HashMap;

    fn lower_ok(src: &str) -> Message {
        let (cst, errors) = parse(src);
        assert!(errors.is_empty(), "{errors:?}");
        lower(src, &cst).expect("lowering should succeed")
    }

    fn pattern_expr(message: &Message) -> &Expression {
        match message {
            Message::Pattern(p) => p
                .pattern
                .parts
                .iter()
                .find_map(|part| match part {
                    crate::model::PatternPart::Expression(e) => Some(e),
                    _ => None,
                })
                .expect("expected an expression in the pattern"),
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn unresolved_variable_produces_dollar_braced_fallback() {
        let source = "Hi {$name}!";
        let message = lower_ok(source);
        let args = HashMap::new();
        let scope = Scope::new(&args, message.declarations());
        let registry = FunctionRegistry::default();
        let locales = vec!["en".to_string()];
        let resolver = Resolver::new(source, &registry, &locales, Direction::Ltr);
        let mut sink = CollectingSink::default();
        let value = resolver.resolve_expression(&scope, pattern_expr(&message), &mut sink);
        assert_eq!(value.string_value(), "{$name}");
        assert_eq!(sink.errors.len(), 1);
    }

    #[test]
    fn bound_variable_formats_plainly() {
        let source = "Hi {$name}!";
        let message = lower_ok(source);
        let mut args = HashMap::new();
        args.insert("name".to_string(), RuntimeValue::String("World".into()));
        let scope = Scope::new(&args, message.declarations());
        let registry = FunctionRegistry::default();
        let locales = vec!["en".to_string()];
        let resolver = Resolver::new(source, &registry, &locales, Direction::Ltr);
        let mut sink = CollectingSink::default();
        let value = resolver.resolve_expression(&scope, pattern_expr(&message), &mut sink);
        assert_eq!(value.string_value(), "World");
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn unknown_function_becomes_fallback() {
        let source = "{$x :frobnicate}";
        let message = lower_ok(source);
        let mut args = HashMap::new();
        args.insert("x".to_string(), RuntimeValue::Integer(1));
        let scope = Scope::new(&args, message.declarations());
        let registry = FunctionRegistry::default();
        let locales = vec!["en".to_string()];
        let resolver = Resolver::new(source, &registry, &locales, Direction::Ltr);
        let mut sink = CollectingSink::default();
        let value = resolver.resolve_expression(&scope, pattern_expr(&message), &mut sink);
        assert_eq!(value.string_value(), "{$x :frobnicate}");
        assert!(sink.errors.iter().any(|e| matches!(e, ResolutionError::UnknownFunction { .. })));
    }

    #[test]
    fn local_declaration_memoizes_its_value() {
        let source = ".local $y = {$x :number}\n{$y} and {$y}";
        let message = lower_ok(source);
        let mut args = HashMap::new();
        args.insert("x".to_string(), RuntimeValue::Integer(3));
        let scope = Scope::new(&args, message.declarations());
        let registry = FunctionRegistry::default();
        let locales = vec!["en".to_string()];
        let resolver = Resolver::new(source, &registry, &locales, Direction::Ltr);
        let mut sink = CollectingSink::default();
        // Force the same declaration twice through two separate pattern
        // expressions; the second lookup must hit the memo, not invoke
        // `:number` again.
        let value1 = resolver.resolve_variable(&scope, "y", Span::new(0, 0), &mut sink).unwrap();
        let value2 = resolver.resolve_variable(&scope, "y", Span::new(0, 0), &mut sink).unwrap();
        assert_eq!(value1.as_display_string(), "3");
        assert_eq!(value2.as_display_string(), "3");
    }

    #[test]
    fn cyclic_local_declarations_report_cyclic_declaration() {
        let source = ".local $a = {$b}\n.local $b = {$a}\n{{{$a}}}";
        let message = lower_ok(source);
        let args = HashMap::new();
        let scope = Scope::new(&args, message.declarations());
        let registry = FunctionRegistry::default();
        let locales = vec!["en".to_string()];
        let resolver = Resolver::new(source, &registry, &locales, Direction::Ltr);
        let mut sink = CollectingSink::default();
        let _ = resolver.resolve_variable(&scope, "a", Span::new(0, 0), &mut sink);
        assert!(sink.errors.iter().any(|e| matches!(e, ResolutionError::CyclicDeclaration { .. })));
    }
}
