//! Concrete Syntax Tree: the span-bearing parse tree produced by `parser.rs`.
//!
//! Shapes mirror `model.rs`'s Data Model closely, but every node
//! here carries a [`Span`] and the tree may contain `Junk` recovery nodes
//! that the Data Model never sees.

use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    pub span: Span,
    pub text: String,
}

/// `name` or `namespace : name`, with the separator's span preserved
/// separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub namespace: Option<SyntaxToken>,
    pub colon: Option<Span>,
    pub name: SyntaxToken,
}

impl Identifier {
    pub fn span(&self) -> Span {
        match &self.namespace {
            Some(ns) => ns.span.join(self.name.span),
            None => self.name.span,
        }
    }

    /// The fully-qualified name, e.g. `"ns:name"` or `"name"`.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns.text, self.name.text),
            None => self.name.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub span: Span,
    pub value: String,
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub span: Span,
    /// Name excludes the leading `$`.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralOrVariable {
    Literal(Literal),
    Variable(VariableRef),
}

impl LiteralOrVariable {
    pub fn span(&self) -> Span {
        match self {
            LiteralOrVariable::Literal(l) => l.span,
            LiteralOrVariable::Variable(v) => v.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstOption {
    pub name: Identifier,
    pub value: LiteralOrVariable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub span: Span,
    pub name: Identifier,
    pub value: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub span: Span,
    pub name: Identifier,
    pub options: Vec<CstOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupKind {
    Open,
    Close,
    Standalone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    pub span: Span,
    pub kind: MarkupKind,
    pub name: Identifier,
    pub options: Vec<CstOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Function(FunctionRef),
    Markup(Markup),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub span: Span,
    pub arg: Option<LiteralOrVariable>,
    pub annotation: Option<Annotation>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub span: Span,
    pub value: String,
}

/// A recovery node spanning bytes the parser could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junk {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    Text(Text),
    Expression(Expression),
    Markup(Markup),
    Junk(Junk),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    pub parts: Vec<PatternPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeclaration {
    pub span: Span,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDeclaration {
    pub span: Span,
    pub name: SyntaxToken,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Input(InputDeclaration),
    Local(LocalDeclaration),
    Junk(Junk),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Literal(Literal),
    Catchall(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub keys: Vec<Key>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectMessageCst {
    pub declarations: Vec<Declaration>,
    /// Full selector expressions, not just the variable name: a selector
    /// may carry its own inline annotation (`.match {$n :number}`) rather
    /// than relying on a `.input`/`.local` declaration for one.
    pub selectors: Vec<Expression>,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMessageCst {
    pub declarations: Vec<Declaration>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageCst {
    Pattern(PatternMessageCst),
    Select(SelectMessageCst),
    Junk { declarations: Vec<Declaration>, span: Span },
}
