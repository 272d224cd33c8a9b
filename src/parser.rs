//! Recursive-descent parser producing a span-bearing CST.
//!
//! Grounded on `seq-compiler`'s hand-rolled `Parser` shape (a cursor over
//! source plus small `parse_*` methods that each consume one grammar
//! production) rather than a parser-combinator or generated-grammar
//! crate — nothing in this pack reaches for one of those for a
//! recursive-descent grammar this size.
//!
//! Errors are never fatal here: every `parse_*` method that hits a
//! malformed construct records a [`ParseError`] and recovers (skipping to
//! the next plausible sync point) so the rest of the message still
//! parses. `lower` in `model.rs` is what ultimately decides whether a
//! CST with errors can still produce a Data Model.

use crate::cst::*;
use crate::errors::{ParseError, ParseErrorKind};
use crate::scanner::{self, recognize_escape};
use crate::span::Span;
use crate::token::Cursor;

struct Parser<'a> {
    cur: Cursor<'a>,
    errors: Vec<ParseError>,
    resource_mode: bool,
}

/// Parse `source` into a CST, never failing outright: malformed
/// constructs become `Junk` nodes and are reported in the returned error
/// list. Equivalent to `parse_with_mode(source, false)` — §4.1's
/// resource-mode escapes (`\n`, `\xHH`, indent collapsing, ...) are opt-in.
pub fn parse(source: &str) -> (MessageCst, Vec<ParseError>) {
    parse_with_mode(source, false)
}

/// Parse `source` into a CST with `resource_mode` controlling the §4.1
/// opt-in escape set and newline/indent collapsing, applied uniformly to
/// pattern text and quoted literals alike (the host-application choice of
/// "resource format" vs. plain inline message source).
pub fn parse_with_mode(source: &str, resource_mode: bool) -> (MessageCst, Vec<ParseError>) {
    let mut p = Parser { cur: Cursor::new(source), errors: Vec::new(), resource_mode };
    let cst = p.parse_message();
    (cst, p.errors)
}

impl<'a> Parser<'a> {
    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError { kind, span });
    }

    fn skip_ws(&mut self) {
        self.cur.eat_while(scanner::is_pattern_whitespace);
    }

    /// Like [`Self::skip_ws`] but reports whether any whitespace was
    /// actually consumed, for the grammar's mandatory-separator positions
    /// (arg/annotation, option/option, annotation/attribute).
    fn skip_required_ws(&mut self) -> bool {
        !self.cur.eat_while(scanner::is_pattern_whitespace).is_empty()
    }

    fn parse_message(&mut self) -> MessageCst {
        if self.cur.starts_with(".input") || self.cur.starts_with(".local") || self.cur.starts_with(".match") {
            self.parse_complex_message()
        } else {
            let pattern = self.parse_pattern(false);
            MessageCst::Pattern(PatternMessageCst { declarations: Vec::new(), pattern })
        }
    }

    fn parse_complex_message(&mut self) -> MessageCst {
        let mut declarations = Vec::new();
        loop {
            self.skip_ws();
            if self.cur.starts_with(".input") {
                declarations.push(self.parse_input_declaration());
            } else if self.cur.starts_with(".local") {
                declarations.push(self.parse_local_declaration());
            } else {
                break;
            }
        }
        self.skip_ws();
        if self.cur.starts_with(".match") {
            self.parse_match_body(declarations)
        } else if self.cur.starts_with("{{") {
            let pattern = self.parse_quoted_pattern();
            MessageCst::Pattern(PatternMessageCst { declarations, pattern })
        } else {
            let span = self.cur.span_from(self.cur.pos());
            self.error(ParseErrorKind::MissingSyntax { expected: "matcher or quoted pattern".into() }, span);
            MessageCst::Junk { declarations, span }
        }
    }

    fn parse_input_declaration(&mut self) -> Declaration {
        let start = self.cur.pos();
        self.cur.bump_str(".input");
        self.skip_ws();
        let expr = self.parse_expression();
        let span = self.cur.span_from(start);
        if !matches!(&expr.arg, Some(LiteralOrVariable::Variable(_))) {
            self.error(ParseErrorKind::BadInputExpression { reason: "operand of .input must be a variable".into() }, span);
        }
        Declaration::Input(InputDeclaration { span, expr })
    }

    fn parse_local_declaration(&mut self) -> Declaration {
        let start = self.cur.pos();
        self.cur.bump_str(".local");
        self.skip_ws();
        if self.cur.peek() != Some('$') {
            let span = self.cur.span_from(self.cur.pos());
            self.error(ParseErrorKind::MissingSyntax { expected: "$".into() }, span);
            return Declaration::Junk(Junk { span });
        }
        self.cur.bump();
        let name = self.parse_name_token();
        self.skip_ws();
        if self.cur.peek() != Some('=') {
            let span = self.cur.span_from(self.cur.pos());
            self.error(ParseErrorKind::MissingSyntax { expected: "=".into() }, span);
        } else {
            self.cur.bump();
        }
        self.skip_ws();
        let expr = self.parse_expression();
        let span = self.cur.span_from(start);
        Declaration::Local(LocalDeclaration { span, name, expr })
    }

    /// A `{ ... }` placeholder: optional operand, optional annotation,
    /// zero or more attributes.
    fn parse_expression(&mut self) -> Expression {
        let start = self.cur.pos();
        if self.cur.peek() != Some('{') {
            self.error(ParseErrorKind::MissingSyntax { expected: "{".into() }, self.cur.span_from(start));
            return Expression { span: self.cur.span_from(start), arg: None, annotation: None, attributes: Vec::new() };
        }
        self.cur.bump();
        self.skip_ws();

        let arg = match self.cur.peek() {
            Some('$') => Some(LiteralOrVariable::Variable(self.parse_variable_ref())),
            Some(c) if is_literal_start(c) => Some(LiteralOrVariable::Literal(self.parse_literal())),
            _ => None,
        };
        let ws_after_arg = self.skip_required_ws();

        if arg.is_some() && matches!(self.cur.peek(), Some(':') | Some('#') | Some('/')) && !ws_after_arg {
            self.error(ParseErrorKind::MissingSyntax { expected: "whitespace between arg and annotation".into() }, self.cur.span_from(self.cur.pos()));
        }

        let annotation = match self.cur.peek() {
            Some(':') => Some(Annotation::Function(self.parse_function_ref())),
            Some('#') | Some('/') if arg.is_none() => Some(Annotation::Markup(self.parse_markup())),
            Some('#') | Some('/') => {
                // Combined markup + arg: a syntax error reported on the
                // arg's span, but the markup tokens are still consumed so
                // the rest of the expression (attributes, closing brace)
                // parses normally instead of being scanned as junk.
                let arg_span = arg.as_ref().map(LiteralOrVariable::span).unwrap_or_else(|| self.cur.span_from(self.cur.pos()));
                self.error(ParseErrorKind::ExtraContent, arg_span);
                self.parse_markup();
                None
            }
            _ => None,
        };
        let ws_after_annotation = self.skip_required_ws();

        let mut attributes = Vec::new();
        let mut first_attribute = true;
        while self.cur.peek() == Some('@') {
            if first_attribute && annotation.is_some() && !ws_after_annotation {
                self.error(ParseErrorKind::MissingSyntax { expected: "whitespace between annotation and attribute".into() }, self.cur.span_from(self.cur.pos()));
            }
            first_attribute = false;
            attributes.push(self.parse_attribute());
            self.skip_ws();
        }

        if arg.is_none() && annotation.is_none() {
            self.error(ParseErrorKind::EmptyToken, self.cur.span_from(start));
        }

        if self.cur.peek() == Some('}') {
            self.cur.bump();
        } else {
            self.error(ParseErrorKind::MissingSyntax { expected: "}".into() }, self.cur.span_from(self.cur.pos()));
            self.cur.eat_while(|c| c != '}' && c != '\n');
            if self.cur.peek() == Some('}') {
                self.cur.bump();
            }
        }

        Expression { span: self.cur.span_from(start), arg, annotation, attributes }
    }

    fn parse_variable_ref(&mut self) -> VariableRef {
        let start = self.cur.pos();
        self.cur.bump(); // '$'
        let name_span = self.cur.eat_while(scanner::is_name_continue);
        if name_span.is_empty() {
            self.error(ParseErrorKind::MissingSyntax { expected: "variable name".into() }, self.cur.span_from(start));
        }
        VariableRef { span: self.cur.span_from(start), name: self.cur.slice(name_span).to_string() }
    }

    fn parse_name_token(&mut self) -> SyntaxToken {
        let start = self.cur.pos();
        match self.cur.peek() {
            Some(c) if scanner::is_name_start(c) => {
                self.cur.bump();
            }
            _ => {
                self.error(ParseErrorKind::MissingSyntax { expected: "name".into() }, self.cur.span_from(start));
                return SyntaxToken { span: self.cur.span_from(start), text: String::new() };
            }
        }
        self.cur.eat_while(scanner::is_name_continue);
        let span = self.cur.span_from(start);
        SyntaxToken { span, text: self.cur.slice(span).to_string() }
    }

    fn parse_identifier(&mut self) -> Identifier {
        let first = self.parse_name_token();
        if self.cur.peek() == Some(':') {
            let colon_start = self.cur.pos();
            self.cur.bump();
            let colon = self.cur.span_from(colon_start);
            let name = self.parse_name_token();
            Identifier { namespace: Some(first), colon: Some(colon), name }
        } else {
            Identifier { namespace: None, colon: None, name: first }
        }
    }

    fn parse_literal(&mut self) -> Literal {
        if self.cur.peek() == Some('|') {
            self.parse_quoted_literal()
        } else {
            self.parse_unquoted_literal()
        }
    }

    fn parse_quoted_literal(&mut self) -> Literal {
        let start = self.cur.pos();
        self.cur.bump(); // opening '|'
        let mut value = String::new();
        loop {
            match self.cur.peek() {
                None => {
                    self.error(ParseErrorKind::MissingSyntax { expected: "|".into() }, self.cur.span_from(self.cur.pos()));
                    break;
                }
                Some('|') => {
                    self.cur.bump();
                    break;
                }
                Some('\\') => match recognize_escape(self.cur.rest(), 0, self.resource_mode) {
                    Some(Ok(escape)) => {
                        value.push_str(&escape.value);
                        for _ in 0..escape.consumed {
                            self.cur.bump();
                        }
                    }
                    _ => {
                        self.error(ParseErrorKind::BadEscape, self.cur.span_from(self.cur.pos()));
                        value.push('\\');
                        self.cur.bump();
                    }
                },
                Some(c) => {
                    value.push(c);
                    self.cur.bump();
                }
            }
        }
        if self.resource_mode {
            value = scanner::collapse_trailing_indent(&value);
        }
        Literal { span: self.cur.span_from(start), value, quoted: true }
    }

    fn parse_unquoted_literal(&mut self) -> Literal {
        let start = self.cur.pos();
        if self.cur.peek() == Some('-') {
            self.cur.bump();
        }
        self.cur.eat_while(|c| scanner::is_name_continue(c) || c == '.');
        let span = self.cur.span_from(start);
        let value = self.cur.slice(span).to_string();
        if value.is_empty() || value == "-" {
            self.error(ParseErrorKind::EmptyToken, span);
        }
        Literal { span, value, quoted: false }
    }

    fn parse_options(&mut self) -> Vec<CstOption> {
        let mut options = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut first = true;
        loop {
            let save = self.cur.pos();
            let ws_before = self.skip_required_ws();
            match self.cur.peek() {
                Some(c) if scanner::is_name_start(c) => {}
                _ => {
                    self.cur.set_pos(save);
                    break;
                }
            }
            if !first && !ws_before {
                self.error(ParseErrorKind::MissingSyntax { expected: "whitespace between options".into() }, self.cur.span_from(self.cur.pos()));
            }
            first = false;
            let name = self.parse_identifier();
            self.skip_ws();
            if self.cur.peek() == Some('=') {
                self.cur.bump();
            } else {
                self.error(ParseErrorKind::MissingSyntax { expected: "=".into() }, self.cur.span_from(self.cur.pos()));
            }
            self.skip_ws();
            let value = match self.cur.peek() {
                Some('$') => LiteralOrVariable::Variable(self.parse_variable_ref()),
                _ => LiteralOrVariable::Literal(self.parse_literal()),
            };
            let qname = name.qualified_name();
            if !seen.insert(qname.clone()) {
                self.error(ParseErrorKind::DuplicateOptionName { name: qname }, name.span());
                continue;
            }
            options.push(CstOption { name, value });
        }
        options
    }

    fn parse_function_ref(&mut self) -> FunctionRef {
        let start = self.cur.pos();
        self.cur.bump(); // ':'
        let name = self.parse_identifier();
        let options = self.parse_options();
        FunctionRef { span: self.cur.span_from(start), name, options }
    }

    fn parse_markup(&mut self) -> Markup {
        let start = self.cur.pos();
        let closing = self.cur.peek() == Some('/');
        self.cur.bump(); // '#' or '/'
        let name = self.parse_identifier();
        let options = self.parse_options();
        self.skip_ws();
        let standalone = !closing && self.cur.peek() == Some('/');
        if standalone {
            self.cur.bump();
        }
        let kind = if closing {
            MarkupKind::Close
        } else if standalone {
            MarkupKind::Standalone
        } else {
            MarkupKind::Open
        };
        Markup { span: self.cur.span_from(start), kind, name, options }
    }

    fn parse_attribute(&mut self) -> Attribute {
        let start = self.cur.pos();
        self.cur.bump(); // '@'
        let name = self.parse_identifier();
        self.skip_ws();
        let value = if self.cur.peek() == Some('=') {
            self.cur.bump();
            self.skip_ws();
            Some(self.parse_literal())
        } else {
            None
        };
        Attribute { span: self.cur.span_from(start), name, value }
    }

    fn parse_quoted_pattern(&mut self) -> Pattern {
        self.cur.bump_str("{{");
        let pattern = self.parse_pattern(true);
        if self.cur.starts_with("}}") {
            self.cur.bump_str("}}");
        } else {
            self.error(ParseErrorKind::MissingSyntax { expected: "}}".into() }, self.cur.span_from(self.cur.pos()));
        }
        pattern
    }

    fn parse_pattern(&mut self, quoted: bool) -> Pattern {
        let mut parts = Vec::new();
        let mut text_start = self.cur.pos();

        loop {
            if self.cur.at_end() || (quoted && self.cur.starts_with("}}")) {
                break;
            }
            match self.cur.peek() {
                Some('{') => {
                    self.flush_text(&mut parts, text_start);
                    if self.cur.peek2() == Some('#') || self.cur.peek2() == Some('/') {
                        self.cur.bump();
                        self.skip_ws();
                        let markup = self.parse_markup();
                        self.skip_ws();
                        if self.cur.peek() == Some('}') {
                            self.cur.bump();
                        } else {
                            self.error(ParseErrorKind::MissingSyntax { expected: "}".into() }, self.cur.span_from(self.cur.pos()));
                            self.cur.eat_while(|c| c != '}' && c != '\n');
                            if self.cur.peek() == Some('}') {
                                self.cur.bump();
                            }
                        }
                        parts.push(PatternPart::Markup(markup));
                    } else {
                        let expr = self.parse_expression();
                        parts.push(PatternPart::Expression(expr));
                    }
                    text_start = self.cur.pos();
                }
                Some('}') => {
                    self.flush_text(&mut parts, text_start);
                    let span = self.cur.span_from(self.cur.pos());
                    self.error(ParseErrorKind::ExtraContent, span);
                    parts.push(PatternPart::Junk(Junk { span }));
                    self.cur.bump();
                    text_start = self.cur.pos();
                }
                Some('\\') => {
                    self.flush_text(&mut parts, text_start);
                    match recognize_escape(self.cur.rest(), 0, self.resource_mode) {
                        Some(Ok(escape)) => {
                            let esc_start = self.cur.pos();
                            for _ in 0..escape.consumed {
                                self.cur.bump();
                            }
                            parts.push(PatternPart::Text(Text { span: self.cur.span_from(esc_start), value: escape.value }));
                        }
                        _ => {
                            let esc_start = self.cur.pos();
                            self.error(ParseErrorKind::BadEscape, self.cur.span_from(esc_start));
                            self.cur.bump();
                            parts.push(PatternPart::Text(Text { span: self.cur.span_from(esc_start), value: "\\".to_string() }));
                        }
                    }
                    text_start = self.cur.pos();
                }
                Some(_) => {
                    self.cur.bump();
                }
                None => break,
            }
        }
        self.flush_text(&mut parts, text_start);
        Pattern { parts }
    }

    fn flush_text(&mut self, parts: &mut Vec<PatternPart>, text_start: usize) {
        let span = self.cur.span_from(text_start);
        if !span.is_empty() {
            let mut value = self.cur.slice(span).to_string();
            if self.resource_mode {
                value = scanner::collapse_trailing_indent(&value);
            }
            parts.push(PatternPart::Text(Text { span, value }));
        }
    }

    fn parse_match_body(&mut self, declarations: Vec<Declaration>) -> MessageCst {
        self.cur.bump_str(".match");
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            if self.cur.peek() == Some('{') {
                selectors.push(self.parse_expression());
            } else {
                break;
            }
        }
        if selectors.is_empty() {
            self.error(ParseErrorKind::MissingSyntax { expected: "selector expression".into() }, self.cur.span_from(self.cur.pos()));
        }
        let mut variants = Vec::new();
        loop {
            self.skip_ws();
            if self.cur.at_end() {
                break;
            }
            match self.cur.peek() {
                Some('*') => {}
                Some(c) if is_literal_start(c) => {}
                _ => break,
            }
            variants.push(self.parse_variant(selectors.len().max(1)));
        }
        MessageCst::Select(SelectMessageCst { declarations, selectors, variants })
    }

    fn parse_variant(&mut self, expected_keys: usize) -> Variant {
        let mut keys = Vec::new();
        for _ in 0..expected_keys {
            self.skip_ws();
            match self.cur.peek() {
                Some('*') => {
                    let start = self.cur.pos();
                    self.cur.bump();
                    keys.push(Key::Catchall(self.cur.span_from(start)));
                }
                Some(c) if is_literal_start(c) => {
                    keys.push(Key::Literal(self.parse_literal()));
                }
                _ => {
                    self.error(ParseErrorKind::MissingSyntax { expected: "key".into() }, self.cur.span_from(self.cur.pos()));
                    break;
                }
            }
        }
        self.skip_ws();
        let pattern = if self.cur.starts_with("{{") {
            self.parse_quoted_pattern()
        } else {
            self.error(ParseErrorKind::MissingSyntax { expected: "{{".into() }, self.cur.span_from(self.cur.pos()));
            Pattern::default()
        };
        Variant { keys, pattern }
    }
}

fn is_literal_start(c: char) -> bool {
    c == '|' || c == '-' || c.is_ascii_digit() || scanner::is_name_start(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_message_parses_text_and_placeholder() {
        let (cst, errors) = parse("Hello, {$name}!");
        assert!(errors.is_empty());
        match cst {
            MessageCst::Pattern(p) => assert_eq!(p.pattern.parts.len(), 3),
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn complex_message_with_input_and_quoted_pattern() {
        let (cst, errors) = parse(".input {$name :string}\n{{Hi {$name}}}");
        assert!(errors.is_empty(), "{errors:?}");
        match cst {
            MessageCst::Pattern(p) => {
                assert_eq!(p.declarations.len(), 1);
                assert_eq!(p.pattern.parts.len(), 2);
            }
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn match_message_with_catchall() {
        let src = ".input {$count :number}\n.match $count\n1 {{one}}\n* {{other}}";
        let (cst, errors) = parse(src);
        assert!(errors.is_empty(), "{errors:?}");
        match cst {
            MessageCst::Select(m) => {
                assert_eq!(m.selectors.len(), 1);
                assert_eq!(m.variants.len(), 2);
                assert!(matches!(m.variants[1].keys[0], Key::Catchall(_)));
            }
            _ => panic!("expected select message"),
        }
    }

    #[test]
    fn unterminated_placeholder_reports_missing_syntax() {
        let (_, errors) = parse("Hello {$name");
        assert!(!errors.is_empty());
    }

    #[test]
    fn unknown_escape_reports_bad_escape() {
        let (_, errors) = parse(r"oops \q here");
        assert!(errors.iter().any(|e| matches!(e.kind, ParseErrorKind::BadEscape)));
    }

    #[test]
    fn resource_mode_escapes_are_rejected_by_default() {
        let (_, errors) = parse(r"tab:\t");
        assert!(errors.iter().any(|e| matches!(e.kind, ParseErrorKind::BadEscape)));
    }

    #[test]
    fn resource_mode_enables_hex_escapes_and_indent_collapsing() {
        let (cst, errors) = parse_with_mode("a\\u0041\n   b", true);
        assert!(errors.is_empty(), "{errors:?}");
        match cst {
            MessageCst::Pattern(p) => {
                let text: String = p
                    .pattern
                    .parts
                    .iter()
                    .map(|part| match part {
                        PatternPart::Text(t) => t.value.clone(),
                        _ => String::new(),
                    })
                    .collect();
                assert_eq!(text, "aA\nb");
            }
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn markup_roundtrips_in_pattern() {
        let (cst, errors) = parse("{#b}bold{/b}");
        assert!(errors.is_empty(), "{errors:?}");
        match cst {
            MessageCst::Pattern(p) => {
                assert_eq!(p.pattern.parts.len(), 3);
                assert!(matches!(p.pattern.parts[0], PatternPart::Markup(_)));
                assert!(matches!(p.pattern.parts[2], PatternPart::Markup(_)));
            }
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn markup_combined_with_arg_reports_extra_content_on_arg_span() {
        let (_, errors) = parse("{$name #b}");
        assert!(
            errors.iter().any(|e| matches!(e.kind, ParseErrorKind::ExtraContent)),
            "{errors:?}"
        );
    }

    #[test]
    fn close_markup_with_options_parses_cleanly() {
        let (cst, errors) = parse("{#b}bold{/b extra=1}");
        assert!(errors.is_empty(), "{errors:?}");
        match cst {
            MessageCst::Pattern(p) => match &p.pattern.parts[2] {
                PatternPart::Markup(m) => {
                    assert_eq!(m.options.len(), 1);
                }
                other => panic!("expected close markup, got {other:?}"),
            },
            _ => panic!("expected pattern message"),
        }
    }

    #[test]
    fn missing_whitespace_between_arg_and_annotation_is_rejected() {
        let (_, errors) = parse("{$name:string}");
        assert!(
            errors.iter().any(|e| matches!(e.kind, ParseErrorKind::MissingSyntax { .. })),
            "{errors:?}"
        );
    }

    #[test]
    fn missing_whitespace_between_options_is_rejected() {
        let (_, errors) = parse("{:fn a=|x|b=2}");
        assert!(
            errors.iter().any(|e| matches!(e.kind, ParseErrorKind::MissingSyntax { .. })),
            "{errors:?}"
        );
    }

    #[test]
    fn attribute_only_expression_without_arg_is_rejected() {
        let (_, errors) = parse("{@attr}");
        assert!(errors.iter().any(|e| matches!(e.kind, ParseErrorKind::EmptyToken)), "{errors:?}");
    }

    #[test]
    fn arg_with_attribute_and_no_annotation_is_still_accepted() {
        let (_, errors) = parse("{$name @attr}");
        assert!(errors.is_empty(), "{errors:?}");
    }
}
