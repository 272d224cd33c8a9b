//! The function registry: the `MessageFunction` contract, the
//! built-in functions, and a table mapping names to implementations.
//!
//! Grounded on `builtins.rs`'s signature-table pattern (a `HashMap<String,
//! Effect>` built once and looked up by name) — here the table holds
//! trait objects instead of stack-effect signatures, since a message
//! function's "signature" is behavior, not a type to check.

use crate::locale::{self, LocaleDirection};
use crate::span::Span;
use crate::value::{Direction, MessagePart, MessageValue, OptionsMap, ResolvedValue, RuntimeValue};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a function needs besides its options and operand: the
/// negotiated locale list, the span of the source expression (for error
/// reporting and fallback rendering), and the message's own direction.
pub struct FunctionContext<'a> {
    pub locales: &'a [String],
    pub source: Span,
    pub message_direction: Direction,
}

impl<'a> FunctionContext<'a> {
    pub fn primary_locale(&self) -> &str {
        self.locales.first().map(String::as_str).unwrap_or("en")
    }
}

/// A function's failure reason — never a panic. The resolver converts this
/// into a `bad-operand`/`bad-option` [`crate::errors::ResolutionError`] and
/// a fallback `MessageValue`.
#[derive(Debug, Clone)]
pub struct FunctionError {
    pub option: Option<String>,
    pub reason: String,
}

impl FunctionError {
    pub fn operand(reason: impl Into<String>) -> Self {
        FunctionError { option: None, reason: reason.into() }
    }

    pub fn option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        FunctionError { option: Some(name.into()), reason: reason.into() }
    }
}

/// The contract every built-in and host-registered message function
/// implements.
pub trait MessageFunction: Send + Sync {
    fn call(
        &self,
        ctx: &FunctionContext,
        options: &OptionsMap,
        operand: Option<ResolvedValue>,
    ) -> Result<MessageValue, FunctionError>;
}

impl<F> MessageFunction for F
where
    F: Fn(&FunctionContext, &OptionsMap, Option<ResolvedValue>) -> Result<MessageValue, FunctionError> + Send + Sync,
{
    fn call(
        &self,
        ctx: &FunctionContext,
        options: &OptionsMap,
        operand: Option<ResolvedValue>,
    ) -> Result<MessageValue, FunctionError> {
        self(ctx, options, operand)
    }
}

/// The merged function table: built-ins plus any host-registered
/// functions. A name collision is last-registration-wins, the same
/// silent-shadow rule `options.rs`'s builder documents for its own
/// `with_function` entry point.
#[derive(Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn MessageFunction>>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut reg = FunctionRegistry { functions: HashMap::new() };
        reg.register("string", Arc::new(string_fn));
        reg.register("number", Arc::new(number_fn));
        reg.register("integer", Arc::new(integer_fn));
        reg.register("datetime", Arc::new(datetime_fn));
        reg.register("date", Arc::new(date_fn));
        reg.register("time", Arc::new(time_fn));
        reg.register("currency", Arc::new(currency_fn));
        reg.register("percent", Arc::new(percent_fn));
        reg.register("offset", Arc::new(offset_fn));
        reg.register("unit", Arc::new(unit_fn));
        reg
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry { functions: HashMap::new() }
    }

    pub fn register(&mut self, name: &str, f: Arc<dyn MessageFunction>) {
        self.functions.insert(name.to_string(), f);
    }

    /// Consuming builder form, matching `config.rs`'s `with_*` style.
    pub fn with_function(mut self, name: &str, f: Arc<dyn MessageFunction>) -> Self {
        self.register(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MessageFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Every function name available in this table, built-in and
    /// host-registered alike.
    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }
}

fn option_str(options: &OptionsMap, name: &str) -> Option<String> {
    options.get(name).map(|v| v.as_display_string())
}

fn operand_number(operand: &Option<ResolvedValue>, fn_name: &str) -> Result<f64, FunctionError> {
    let operand = operand.as_ref().ok_or_else(|| FunctionError::operand(format!("{fn_name} requires an operand")))?;
    operand.as_f64().ok_or_else(|| FunctionError::operand(format!("{fn_name} operand is not numeric")))
}

fn numeric_selector_keys(value: f64, exact: &str, locale: &str) -> Vec<String> {
    let category = locale::plural_category(value, locale).as_str().to_string();
    let mut keys = vec![exact.to_string()];
    if category != "other" {
        keys.push(category);
    }
    keys.push("other".to_string());
    keys
}

/// `:number`.
fn number_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let exact = operand
        .as_ref()
        .and_then(|v| match v {
            ResolvedValue::Runtime(r) => r.as_exact_numeric_key(),
            ResolvedValue::Message(m) => Some(m.string_value()),
        })
        .ok_or_else(|| FunctionError::operand(":number requires a numeric operand"))?;
    let n = operand_number(&operand, ":number")?;
    let style = option_str(options, "style").unwrap_or_else(|| "decimal".into());
    let formatted = format_number(n, &style, options, ctx.primary_locale())?;
    let keys = numeric_selector_keys(n, &exact, ctx.primary_locale());
    Ok(MessageValue {
        type_tag: "number",
        direction: Direction::Ltr,
        selector_keys: Some(keys),
        parts: vec![MessagePart::Number(formatted)],
        source: ctx.source,
    })
}

/// `:integer`: `:number` with the operand truncated.
fn integer_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let n = operand_number(&operand, ":integer")?.trunc();
    let exact = format_integer(n);
    let formatted = format_number(n, &option_str(options, "style").unwrap_or_else(|| "decimal".into()), options, ctx.primary_locale())?;
    let keys = numeric_selector_keys(n, &exact, ctx.primary_locale());
    Ok(MessageValue {
        type_tag: "number",
        direction: Direction::Ltr,
        selector_keys: Some(keys),
        parts: vec![MessagePart::Number(formatted)],
        source: ctx.source,
    })
}

fn currency_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let mut options = options.clone();
    options.entry("style".to_string()).or_insert_with(|| ResolvedValue::Runtime(RuntimeValue::String("currency".into())));
    number_fn(ctx, &options, operand)
}

fn percent_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let mut options = options.clone();
    options.entry("style".to_string()).or_insert_with(|| ResolvedValue::Runtime(RuntimeValue::String("percent".into())));
    number_fn(ctx, &options, operand)
}

fn format_integer(n: f64) -> String {
    format!("{n:.0}")
}

fn format_number(n: f64, style: &str, options: &OptionsMap, locale: &str) -> Result<String, FunctionError> {
    let min_frac = options.get("minimumFractionDigits").and_then(|v| v.as_f64()).map(|v| v as usize);
    match style {
        "decimal" | "" => Ok(match min_frac {
            Some(d) => format!("{n:.d$}", d = d),
            None => format_plain_number(n),
        }),
        "percent" => {
            let scaled = n * 100.0;
            Ok(format!("{}%", match min_frac {
                Some(d) => format!("{scaled:.d$}", d = d),
                None => format_plain_number(scaled),
            }))
        }
        "currency" => {
            let currency = option_str(options, "currency").unwrap_or_else(|| "USD".into());
            let symbol = currency_symbol(&currency, locale);
            let digits = min_frac.unwrap_or(2);
            Ok(format!("{symbol}{n:.digits$}"))
        }
        other => Err(FunctionError::option("style", format!("unknown number style '{other}'"))),
    }
}

fn format_plain_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

fn currency_symbol(code: &str, _locale: &str) -> &'static str {
    match code.to_ascii_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        "JPY" => "\u{a5}",
        _ => "",
    }
}

/// `:offset` (draft): shifts a numeric operand by `add`/`subtract`,
/// staying a plain numeric `MessageValue` so it can be piped into
/// `:number` or used directly as a selector.
fn offset_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let n = operand_number(&operand, ":offset")?;
    let add = options.get("add").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let subtract = options.get("subtract").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let shifted = n + add - subtract;
    let exact = format_plain_number(shifted);
    let keys = numeric_selector_keys(shifted, &exact, ctx.primary_locale());
    Ok(MessageValue {
        type_tag: "number",
        direction: Direction::Ltr,
        selector_keys: Some(keys),
        parts: vec![MessagePart::Number(exact)],
        source: ctx.source,
    })
}

/// `:unit` (draft): appends a unit label to a numeric operand's display
/// form. No CLDR unit-plural data is implemented; `unit` is rendered
/// verbatim, reflecting `:unit`'s status as a draft built-in rather than a
/// fully specified one.
fn unit_fn(
    ctx: &FunctionContext,
    options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let n = operand_number(&operand, ":unit")?;
    let unit = option_str(options, "unit").ok_or_else(|| FunctionError::option("unit", ":unit requires a unit option"))?;
    let formatted = format!("{} {unit}", format_plain_number(n));
    Ok(MessageValue {
        type_tag: "unit",
        direction: Direction::Ltr,
        selector_keys: Some(vec![format_plain_number(n), "other".to_string()]),
        parts: vec![MessagePart::Number(formatted)],
        source: ctx.source,
    })
}

/// `:string`: coerces the operand to its display string. Selectable by
/// exact value only (no plural category applies to a bare string).
fn string_fn(
    ctx: &FunctionContext,
    _options: &OptionsMap,
    operand: Option<ResolvedValue>,
) -> Result<MessageValue, FunctionError> {
    let s = operand.as_ref().map(|v| v.as_display_string()).unwrap_or_default();
    Ok(MessageValue {
        type_tag: "string",
        direction: locale::first_strong_direction(&s),
        selector_keys: Some(vec![s.clone()]),
        parts: vec![MessagePart::String(s)],
        source: ctx.source,
    })
}

fn operand_datetime(operand: &Option<ResolvedValue>, fn_name: &str) -> Result<DateTime<FixedOffset>, FunctionError> {
    match operand {
        Some(ResolvedValue::Runtime(RuntimeValue::DateTime(dt))) => Ok(*dt),
        Some(ResolvedValue::Runtime(RuntimeValue::String(s))) => {
            DateTime::parse_from_rfc3339(s).map_err(|_| FunctionError::operand(format!("{fn_name} operand is not a valid datetime")))
        }
        Some(_) => Err(FunctionError::operand(format!("{fn_name} operand is not a datetime"))),
        None => Err(FunctionError::operand(format!("{fn_name} requires an operand"))),
    }
}

fn datetime_style(options: &OptionsMap, key: &str) -> String {
    option_str(options, key).unwrap_or_else(|| "medium".into())
}

fn date_format_for(style: &str) -> &'static str {
    match style {
        "full" => "%A, %B %-d, %Y",
        "long" => "%B %-d, %Y",
        "medium" => "%b %-d, %Y",
        "short" => "%-m/%-d/%y",
        _ => "%b %-d, %Y",
    }
}

fn time_format_for(style: &str) -> &'static str {
    match style {
        "full" | "long" => "%-I:%M:%S %p",
        "medium" => "%-I:%M:%S %p",
        "short" => "%-I:%M %p",
        _ => "%-I:%M:%S %p",
    }
}

fn date_fn(ctx: &FunctionContext, options: &OptionsMap, operand: Option<ResolvedValue>) -> Result<MessageValue, FunctionError> {
    let dt = operand_datetime(&operand, ":date")?;
    let style = datetime_style(options, "style");
    let formatted = dt.format(date_format_for(&style)).to_string();
    Ok(MessageValue {
        type_tag: "datetime",
        direction: Direction::Ltr,
        selector_keys: None,
        parts: vec![MessagePart::DateTime(formatted)],
        source: ctx.source,
    })
}

fn time_fn(ctx: &FunctionContext, options: &OptionsMap, operand: Option<ResolvedValue>) -> Result<MessageValue, FunctionError> {
    let dt = operand_datetime(&operand, ":time")?;
    let style = datetime_style(options, "style");
    let formatted = dt.format(time_format_for(&style)).to_string();
    Ok(MessageValue {
        type_tag: "datetime",
        direction: Direction::Ltr,
        selector_keys: None,
        parts: vec![MessagePart::DateTime(formatted)],
        source: ctx.source,
    })
}

fn datetime_fn(ctx: &FunctionContext, options: &OptionsMap, operand: Option<ResolvedValue>) -> Result<MessageValue, FunctionError> {
    let dt = operand_datetime(&operand, ":datetime")?;
    let date_style = datetime_style(options, "dateStyle");
    let time_style = datetime_style(options, "timeStyle");
    let formatted = format!(
        "{} {}",
        dt.format(date_format_for(&date_style)),
        dt.format(time_format_for(&time_style))
    );
    Ok(MessageValue {
        type_tag: "datetime",
        direction: Direction::Ltr,
        selector_keys: None,
        parts: vec![MessagePart::DateTime(formatted)],
        source: ctx.source,
    })
}

/// Whether `tag` is one of the locale-direction tags the bidi policy in
/// `formatter.rs` needs (kept here since functions are the only place
/// that know the negotiated locale at invocation time).
pub fn direction_from_locale(locale: &str) -> Direction {
    match locale::direction_for(locale) {
        LocaleDirection::Ltr => Direction::Ltr,
        LocaleDirection::Rtl => Direction::Rtl,
        LocaleDirection::Auto => Direction::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn ctx_with<'a>(locales: &'a [String]) -> FunctionContext<'a> {
        FunctionContext { locales, source: Span::new(0, 0), message_direction: Direction::Ltr }
    }

    fn locales_en() -> Vec<String> {
        vec!["en".to_string()]
    }

    #[test]
    fn number_exact_key_beats_plural_category() {
        let locales = locales_en();
        let c = ctx_with(&locales);
        let result = number_fn(&c, &OptionsMap::new(), Some(ResolvedValue::Runtime(RuntimeValue::Integer(0)))).unwrap();
        let keys = result.selector_keys.unwrap();
        assert_eq!(keys[0], "0");
        assert_eq!(keys.last().unwrap(), "other");
    }

    #[test]
    fn number_one_selects_one_category() {
        let locales = locales_en();
        let c = ctx_with(&locales);
        let result = number_fn(&c, &OptionsMap::new(), Some(ResolvedValue::Runtime(RuntimeValue::Integer(1)))).unwrap();
        assert_eq!(result.selector_keys.unwrap(), vec!["1", "one", "other"]);
    }

    #[test]
    fn currency_formats_with_symbol() {
        let locales = locales_en();
        let c = ctx_with(&locales);
        let mut options = OptionsMap::new();
        options.insert("style".into(), ResolvedValue::Runtime(RuntimeValue::String("currency".into())));
        options.insert("currency".into(), ResolvedValue::Runtime(RuntimeValue::String("USD".into())));
        let result = number_fn(&c, &options, Some(ResolvedValue::Runtime(RuntimeValue::Float(42.5)))).unwrap();
        assert_eq!(result.string_value(), "$42.50");
    }

    #[test]
    fn string_fn_is_selectable_by_exact_value() {
        let locales: Vec<String> = Vec::new();
        let c = ctx_with(&locales);
        let result = string_fn(&c, &OptionsMap::new(), Some(ResolvedValue::Runtime(RuntimeValue::String("red".into())))).unwrap();
        assert_eq!(result.selector_keys.unwrap(), vec!["red"]);
    }

    #[test]
    fn missing_operand_is_a_function_error() {
        let locales: Vec<String> = Vec::new();
        let c = ctx_with(&locales);
        assert!(number_fn(&c, &OptionsMap::new(), None).is_err());
    }
}
