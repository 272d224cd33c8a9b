//! The Data Model: the span-free, immutable tree the resolver and
//! selector walk. Produced from the CST by [`lower`], which also performs
//! NFC normalization of identifiers and literal text.

use crate::cst;
use crate::errors::{ParseError, ParseErrorKind};
use crate::span::Span;
use unicode_normalization::UnicodeNormalization;

fn nfc(s: &str) -> String {
    s.nfc().collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub name: String,
    /// Byte span in the original source, kept only for fallback rendering;
    /// never used in equality-sensitive logic.
    pub source: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(Literal),
    Variable(VariableRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Option_ {
    pub name: String,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub name: String,
    pub options: Vec<Option_>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Open,
    Close,
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub kind: MarkupKind,
    pub name: String,
    pub options: Vec<Option_>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Function(FunctionRef),
    Markup(Markup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub arg: Option<Operand>,
    pub annotation: Option<Annotation>,
    pub attributes: Vec<Attribute>,
    /// The original source slice, for building a fallback.
    pub source: Span,
}

impl Expression {
    /// An expression is selectable (usable as a `.match` selector) only if
    /// it carries a function annotation.
    pub fn has_function_annotation(&self) -> bool {
        matches!(self.annotation, Some(Annotation::Function(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    Text(String),
    Expression(Expression),
    Markup(Markup),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    pub parts: Vec<PatternPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeclaration {
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeclaration {
    pub name: String,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Input(InputDeclaration),
    Local(LocalDeclaration),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Input(d) => match &d.expr.arg {
                Some(Operand::Variable(v)) => &v.name,
                _ => "",
            },
            Declaration::Local(d) => &d.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Literal(String),
    Catchall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub keys: Vec<Key>,
    pub pattern: Pattern,
}

impl Variant {
    pub fn is_all_catchall(&self) -> bool {
        self.keys.iter().all(|k| matches!(k, Key::Catchall))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMessage {
    pub declarations: Vec<Declaration>,
    pub selectors: Vec<Expression>,
    pub variants: Vec<Variant>,
}

impl SelectMessage {
    /// The variable name a selector expression selects over, if its
    /// operand is a variable (the only operand shape a selector
    /// expression permits).
    pub fn selector_name(expr: &Expression) -> Option<&str> {
        match &expr.arg {
            Some(Operand::Variable(v)) => Some(&v.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMessage {
    pub declarations: Vec<Declaration>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Pattern(PatternMessage),
    Select(SelectMessage),
}

impl Message {
    pub fn declarations(&self) -> &[Declaration] {
        match self {
            Message::Pattern(m) => &m.declarations,
            Message::Select(m) => &m.declarations,
        }
    }
}

/// Lower a CST into a Data Model, or collect the reasons lowering failed.
/// A [`cst::MessageCst::Junk`] tree, or any `Junk` node reachable from a
/// non-junk tree, prevents a complete lowering; `parse_errors` accumulates
/// every one found instead of stopping at the first.
pub fn lower(source: &str, cst: &cst::MessageCst) -> Result<Message, Vec<ParseError>> {
    let mut errors = Vec::new();
    let result = match cst {
        cst::MessageCst::Pattern(m) => {
            let declarations = lower_declarations(source, &m.declarations, &mut errors);
            let pattern = lower_pattern(source, &m.pattern, &mut errors);
            Message::Pattern(PatternMessage { declarations, pattern })
        }
        cst::MessageCst::Select(m) => {
            let declarations = lower_declarations(source, &m.declarations, &mut errors);
            let selectors = m.selectors.iter().map(|s| lower_expression(source, s, &mut errors)).collect();
            let variants = m
                .variants
                .iter()
                .map(|v| Variant {
                    keys: v
                        .keys
                        .iter()
                        .map(|k| match k {
                            cst::Key::Literal(l) => Key::Literal(nfc(&l.value)),
                            cst::Key::Catchall(_) => Key::Catchall,
                        })
                        .collect(),
                    pattern: lower_pattern(source, &v.pattern, &mut errors),
                })
                .collect();
            Message::Select(SelectMessage { declarations, selectors, variants })
        }
        cst::MessageCst::Junk { span, .. } => {
            errors.push(ParseError { kind: ParseErrorKind::ParseError { message: "unparsable message".into() }, span: *span });
            return Err(errors);
        }
    };
    if errors.is_empty() {
        Ok(result)
    } else {
        Err(errors)
    }
}

fn lower_declarations(source: &str, decls: &[cst::Declaration], errors: &mut Vec<ParseError>) -> Vec<Declaration> {
    decls
        .iter()
        .filter_map(|d| match d {
            cst::Declaration::Input(i) => Some(Declaration::Input(InputDeclaration { expr: lower_expression(source, &i.expr, errors) })),
            cst::Declaration::Local(l) => {
                Some(Declaration::Local(LocalDeclaration { name: nfc(&l.name.text), expr: lower_expression(source, &l.expr, errors) }))
            }
            cst::Declaration::Junk(j) => {
                errors.push(ParseError { kind: ParseErrorKind::ParseError { message: "unparsable declaration".into() }, span: j.span });
                None
            }
        })
        .collect()
}

fn lower_pattern(source: &str, pattern: &cst::Pattern, errors: &mut Vec<ParseError>) -> Pattern {
    let mut parts = Vec::new();
    for part in &pattern.parts {
        match part {
            cst::PatternPart::Text(t) => parts.push(PatternPart::Text(nfc(&t.value))),
            cst::PatternPart::Expression(e) => parts.push(PatternPart::Expression(lower_expression(source, e, errors))),
            cst::PatternPart::Markup(m) => parts.push(PatternPart::Markup(lower_markup(m))),
            cst::PatternPart::Junk(j) => {
                errors.push(ParseError { kind: ParseErrorKind::ParseError { message: "unparsable pattern part".into() }, span: j.span });
            }
        }
    }
    Pattern { parts }
}

fn lower_operand(op: &cst::LiteralOrVariable) -> Operand {
    match op {
        cst::LiteralOrVariable::Literal(l) => Operand::Literal(Literal::Text(nfc(&l.value))),
        cst::LiteralOrVariable::Variable(v) => Operand::Variable(VariableRef { name: nfc(&v.name), source: v.span }),
    }
}

fn lower_option(o: &cst::CstOption) -> Option_ {
    Option_ { name: nfc(&o.name.qualified_name()), value: lower_operand(&o.value) }
}

fn lower_markup(m: &cst::Markup) -> Markup {
    Markup {
        kind: match m.kind {
            cst::MarkupKind::Open => MarkupKind::Open,
            cst::MarkupKind::Close => MarkupKind::Close,
            cst::MarkupKind::Standalone => MarkupKind::Standalone,
        },
        name: nfc(&m.name.qualified_name()),
        options: m.options.iter().map(lower_option).collect(),
    }
}

fn lower_expression(_source: &str, e: &cst::Expression, _errors: &mut [ParseError]) -> Expression {
    Expression {
        arg: e.arg.as_ref().map(lower_operand),
        annotation: e.annotation.as_ref().map(|a| match a {
            cst::Annotation::Function(f) => Annotation::Function(FunctionRef {
                name: nfc(&f.name.qualified_name()),
                options: f.options.iter().map(lower_option).collect(),
            }),
            cst::Annotation::Markup(m) => Annotation::Markup(lower_markup(m)),
        }),
        attributes: e
            .attributes
            .iter()
            .map(|a| Attribute { name: nfc(&a.name.qualified_name()), value: a.value.as_ref().map(|l| nfc(&l.value)) })
            .collect(),
        source: e.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn lower_ok(src: &str) -> Message {
        let (cst, parse_errors) = parse(src);
        assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
        lower(src, &cst).expect("lowering should succeed")
    }

    #[test]
    fn simple_pattern_lowers_to_text_and_expression() {
        let m = lower_ok("Hello, {$name}!");
        match m {
            Message::Pattern(p) => {
                assert_eq!(p.pattern.parts.len(), 3);
                assert!(matches!(p.pattern.parts[0], PatternPart::Text(ref s) if s == "Hello, "));
            }
            _ => panic!("expected a pattern message"),
        }
    }

    #[test]
    fn nfc_normalizes_text_parts() {
        let combining_e = "e\u{0301}";
        let m = lower_ok(combining_e);
        match m {
            Message::Pattern(p) => match &p.pattern.parts[0] {
                PatternPart::Text(s) => assert_eq!(s.chars().count(), 1),
                _ => panic!("expected text part"),
            },
            _ => panic!("expected pattern message"),
        }
    }
}
