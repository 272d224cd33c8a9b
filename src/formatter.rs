//! The part formatter and bidi isolation policy.
//!
//! New, grounded on the general "walk a tree, emit a flat list" shape
//! every pack example's pretty-printer/codegen pass follows (e.g.
//! `seq-compiler`'s `codegen.rs` walking `ast::Expr` to emit IR
//! instructions one at a time) — here the tree is a resolved [`Pattern`]
//! and the emitted list is [`MessagePart`]s instead of instructions.

use crate::errors::ErrorSink;
use crate::model::{MarkupKind, Pattern, PatternPart};
use crate::options::BidiIsolation;
use crate::resolver::Resolver;
use crate::scope::Scope;
use crate::value::{Direction, MessagePart, MessageValue};
use std::collections::BTreeMap;

/// U+2066 LEFT-TO-RIGHT ISOLATE.
pub const LRI: char = '\u{2066}';
/// U+2067 RIGHT-TO-LEFT ISOLATE.
pub const RLI: char = '\u{2067}';
/// U+2068 FIRST STRONG ISOLATE.
pub const FSI: char = '\u{2068}';
/// U+2069 POP DIRECTIONAL ISOLATE.
pub use crate::scanner::PDI;

/// Walk `pattern`, resolving every expression against `scope`, and return
/// the flattened [`MessagePart`] list.
pub fn format_to_parts(
    resolver: &Resolver,
    scope: &Scope,
    pattern: &Pattern,
    message_direction: Direction,
    bidi_isolation: BidiIsolation,
    sink: &mut dyn ErrorSink,
) -> Vec<MessagePart> {
    let mut parts = Vec::new();
    for part in &pattern.parts {
        match part {
            PatternPart::Text(text) => parts.push(MessagePart::Text(text.clone())),
            PatternPart::Markup(markup) => {
                let mut options = BTreeMap::new();
                for opt in &markup.options {
                    options.insert(opt.name.clone(), resolver.resolve_operand_display(scope, &opt.value, sink));
                }
                parts.push(MessagePart::Markup { kind: to_cst_kind(markup.kind), name: markup.name.clone(), options });
            }
            PatternPart::Expression(expr) => {
                let value = resolver.resolve_expression(scope, expr, sink);
                emit_value(&mut parts, &value, message_direction, bidi_isolation);
            }
        }
    }
    parts
}

/// Append `value`'s parts, bracketing them with bidi isolates when the
/// value's direction differs from the message's own.
fn emit_value(parts: &mut Vec<MessagePart>, value: &MessageValue, message_direction: Direction, bidi_isolation: BidiIsolation) {
    let skip_isolation = matches!(bidi_isolation, BidiIsolation::None)
        || (message_direction == Direction::Ltr && value.direction == Direction::Ltr);

    if skip_isolation {
        parts.extend(value.parts.iter().cloned());
        return;
    }

    let open = match value.direction {
        Direction::Ltr => LRI,
        Direction::Rtl => RLI,
        Direction::Auto => FSI,
    };
    parts.push(MessagePart::BidiIsolation(open));
    parts.extend(value.parts.iter().cloned());
    parts.push(MessagePart::BidiIsolation(PDI));
}

fn to_cst_kind(kind: MarkupKind) -> crate::cst::MarkupKind {
    match kind {
        MarkupKind::Open => crate::cst::MarkupKind::Open,
        MarkupKind::Close => crate::cst::MarkupKind::Close,
        MarkupKind::Standalone => crate::cst::MarkupKind::Standalone,
    }
}

/// `format()` is `format_to_parts()` followed by concatenation of every
/// part that contributes to the string.
pub fn concatenate(parts: &[MessagePart]) -> String {
    parts.iter().filter(|p| p.contributes_to_string()).map(MessagePart::string_value).collect()
}
