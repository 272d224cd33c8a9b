//! Runtime values: the argument union callers pass in, the values
//! functions resolve to, and the parts a formatted message is made of.
//!
//! Grounded on `parcadei-ouros`'s `src/value.rs` tagged-union runtime value
//! shape, narrowed to the small fixed union a message function needs to
//! accept rather than a full dynamic object system.

use crate::span::Span;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The fixed union of argument types a host application can pass in.
#[derive(Debug, Clone)]
pub enum RuntimeValue {
    String(String),
    Integer(i64),
    Float(f64),
    /// Stored as a decimal string to avoid pulling in a bignum dependency
    /// for a type most functions treat as "a number with exact text form".
    Decimal(String),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    /// A plugin-recognized type, opaque to the core engine. Carries a type
    /// tag so functions can reject values they don't understand with
    /// `bad-operand` rather than panicking.
    Opaque { tag: &'static str, value: Arc<dyn std::any::Any + Send + Sync> },
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::String(_) => "string",
            RuntimeValue::Integer(_) => "integer",
            RuntimeValue::Float(_) => "float",
            RuntimeValue::Decimal(_) => "decimal",
            RuntimeValue::Boolean(_) => "boolean",
            RuntimeValue::DateTime(_) => "datetime",
            RuntimeValue::Opaque { tag, .. } => tag,
        }
    }

    /// The string form used when an expression has no function/markup
    /// annotation and as a fallback's last resort.
    pub fn as_display_string(&self) -> String {
        match self {
            RuntimeValue::String(s) => s.clone(),
            RuntimeValue::Integer(i) => i.to_string(),
            RuntimeValue::Float(f) => format_float(*f),
            RuntimeValue::Decimal(d) => d.clone(),
            RuntimeValue::Boolean(b) => b.to_string(),
            RuntimeValue::DateTime(dt) => dt.to_rfc3339(),
            RuntimeValue::Opaque { tag, .. } => format!("<{tag}>"),
        }
    }

    /// The exact numeric literal form used as the highest-priority
    /// selector key for `:number`/`:integer`.
    pub fn as_exact_numeric_key(&self) -> Option<String> {
        match self {
            RuntimeValue::Integer(i) => Some(i.to_string()),
            RuntimeValue::Float(f) => Some(format_float(*f)),
            RuntimeValue::Decimal(d) => Some(d.clone()),
            RuntimeValue::String(s) if s.parse::<f64>().is_ok() => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RuntimeValue::Integer(i) => Some(*i as f64),
            RuntimeValue::Float(f) => Some(*f),
            RuntimeValue::Decimal(d) => d.parse().ok(),
            RuntimeValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

/// A value already resolved from a literal or variable reference: the
/// operand or option value passed into a [`crate::registry::MessageFunction`].
#[derive(Debug, Clone)]
pub enum ResolvedValue {
    Runtime(RuntimeValue),
    /// The output of a previous function call, e.g. piping `:number` into
    /// another function's operand.
    Message(MessageValue),
}

impl ResolvedValue {
    pub fn as_display_string(&self) -> String {
        match self {
            ResolvedValue::Runtime(v) => v.as_display_string(),
            ResolvedValue::Message(v) => v.string_value(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ResolvedValue::Runtime(v) => v.as_f64(),
            ResolvedValue::Message(v) => v.string_value().parse().ok(),
        }
    }
}

pub type OptionsMap = BTreeMap<String, ResolvedValue>;

/// Text direction, as produced by locale services or a function's own
/// judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
    Auto,
}

/// One atom of structured, formatted output.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    String(String),
    Number(String),
    DateTime(String),
    Markup { kind: crate::cst::MarkupKind, name: String, options: BTreeMap<String, String> },
    Fallback(String),
    BidiIsolation(char),
    /// A plugin-defined part kind.
    Custom { tag: &'static str, value: String },
}

impl MessagePart {
    /// Whether this part contributes to `format()`'s concatenated string.
    pub fn contributes_to_string(&self) -> bool {
        !matches!(self, MessagePart::Markup { .. })
    }

    pub fn string_value(&self) -> String {
        match self {
            MessagePart::Text(s) | MessagePart::String(s) | MessagePart::Number(s) | MessagePart::DateTime(s) => {
                s.clone()
            }
            MessagePart::Fallback(s) => s.clone(),
            MessagePart::BidiIsolation(c) => c.to_string(),
            MessagePart::Custom { value, .. } => value.clone(),
            MessagePart::Markup { .. } => String::new(),
        }
    }
}

/// The runtime value produced by resolving one expression.
#[derive(Debug, Clone)]
pub struct MessageValue {
    pub type_tag: &'static str,
    pub direction: Direction,
    /// Ordered candidate match keys; `None` means this value's type isn't
    /// selectable and can't annotate a `.match` selector.
    pub selector_keys: Option<Vec<String>>,
    pub parts: Vec<MessagePart>,
    /// The original expression source slice, for fallback rendering.
    pub source: Span,
}

impl MessageValue {
    pub fn fallback(source: Span, text: String) -> Self {
        MessageValue {
            type_tag: "fallback",
            direction: Direction::Auto,
            selector_keys: None,
            parts: vec![MessagePart::Fallback(text)],
            source,
        }
    }

    pub fn string_value(&self) -> String {
        self.parts.iter().map(|p| p.string_value()).collect()
    }
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string_value())
    }
}
