//! End-to-end scenarios and round-trip/law checks run against the public
//! façade only — these exercise the same surface a host application uses.

use messageformat2::{BidiIsolation, CollectingSink, MessageFormat, MessageFormatOptions, ParseErrorKind, ResolutionError, RuntimeValue};
use std::collections::HashMap;

fn format(source: &str, options: MessageFormatOptions, args: &[(&str, RuntimeValue)]) -> String {
    let mf = MessageFormat::new(source, options).expect("message should compile");
    let mut map = HashMap::new();
    for (name, value) in args {
        map.insert(name.to_string(), value.clone());
    }
    mf.format(&map)
}

#[test]
fn scenario_simple_variable() {
    let out = format("Hello, {$name}!", MessageFormatOptions::default(), &[("name", RuntimeValue::String("World".into()))]);
    assert_eq!(out, "Hello, World!");
}

#[test]
fn scenario_pluralization_with_exact_zero_priority() {
    let source = ".input {$count :number}\n.match $count\n0   {{No items}}\none {{One item}}\n*   {{{$count} items}}";
    let options = MessageFormatOptions::default();
    let mf = MessageFormat::new(source, options).unwrap();

    let mut args = HashMap::new();
    args.insert("count".to_string(), RuntimeValue::Integer(0));
    assert_eq!(mf.format(&args), "No items");

    args.insert("count".to_string(), RuntimeValue::Integer(1));
    assert_eq!(mf.format(&args), "One item");

    args.insert("count".to_string(), RuntimeValue::Integer(5));
    assert_eq!(mf.format(&args), "5 items");
}

#[test]
fn scenario_two_selector_matching_with_catchall() {
    let source = ".input {$pools :integer}\n.input {$restaurants :integer}\n.match $pools $restaurants\n0 0 {{no pools and no restaurants}}\n0 * {{no pools and {$restaurants} restaurants}}\n* 0 {{{$pools} pools and no restaurants}}\n* * {{{$pools} pools and {$restaurants} restaurants}}";
    let mf = MessageFormat::new(source, MessageFormatOptions::default()).unwrap();
    let mut args = HashMap::new();
    args.insert("pools".to_string(), RuntimeValue::Integer(2));
    args.insert("restaurants".to_string(), RuntimeValue::Integer(3));
    assert_eq!(mf.format(&args), "2 pools and 3 restaurants");
}

#[test]
fn scenario_currency_via_number_with_options() {
    let source = "Price: {$amount :number style=currency currency=USD}";
    let options = MessageFormatOptions::default().with_locales(vec!["en-US".to_string()]);
    let out = format(source, options, &[("amount", RuntimeValue::Float(42.50))]);
    assert_eq!(out, "Price: $42.50");
}

#[test]
fn scenario_bidi_isolation_on_ltr_message_rtl_value() {
    let source = "User {$name} sent a message";
    let options = MessageFormatOptions::default().with_locales(vec!["en".to_string()]);
    let out = format(source, options, &[("name", RuntimeValue::String("\u{0623}\u{062d}\u{0645}\u{062f}".into()))]);
    assert_eq!(out, "User \u{2067}\u{0623}\u{062d}\u{0645}\u{062f}\u{2069} sent a message");
}

#[test]
fn scenario_markup_in_parts_output() {
    let source = "Welcome {#b}bold{/b} and {#img /} rest";
    let mf = MessageFormat::new(source, MessageFormatOptions::default()).unwrap();
    let args = HashMap::new();
    let parts = mf.format_to_parts(&args);
    assert_eq!(parts.len(), 7);
    assert_eq!(mf.format(&args), "Welcome bold and  rest");
}

#[test]
fn parse_lower_validate_accepts_well_formed_and_rejects_violations() {
    assert!(MessageFormat::new("Hello, {$name}!", MessageFormatOptions::default()).is_ok());
    assert!(MessageFormat::new(".match $count\n1 {{one}}\n* {{other}}", MessageFormatOptions::default()).is_err());
    assert!(MessageFormat::new(".input {$count :number}\n.match $count\n1 {{one}}", MessageFormatOptions::default()).is_err());
}

#[test]
fn format_to_parts_concatenation_equals_format_with_bidi_off() {
    let source = "Price: {$amount :number style=currency currency=USD} for {$name}";
    let options = MessageFormatOptions::default().with_bidi_isolation(BidiIsolation::None);
    let mf = MessageFormat::new(source, options).unwrap();
    let mut args = HashMap::new();
    args.insert("amount".to_string(), RuntimeValue::Float(9.99));
    args.insert("name".to_string(), RuntimeValue::String("Alex".into()));
    let parts = mf.format_to_parts(&args);
    let concatenated: String = parts.iter().filter(|p| p.contributes_to_string()).map(|p| p.string_value()).collect();
    assert_eq!(concatenated, mf.format(&args));
}

#[test]
fn resource_mode_enables_opt_in_escapes_end_to_end() {
    let options = MessageFormatOptions::default().with_resource_mode(true);
    let mf = MessageFormat::new(r"line one\nline two", options).unwrap();
    assert_eq!(mf.format(&HashMap::new()), "line one\nline two");

    let mf = MessageFormat::new(r"line one\nline two", MessageFormatOptions::default()).unwrap();
    assert!(mf.parse_warnings().iter().any(|e| matches!(e.kind, ParseErrorKind::BadEscape)));
    // the bad escape's backslash-sequence is kept literally outside resource mode.
    assert_eq!(mf.format(&HashMap::new()), r"line one\nline two");
}

#[test]
fn resolver_memoization_invokes_a_local_declaration_once() {
    // :number on the same local is referenced three times; if memoization
    // were broken the three occurrences would still agree since :number is
    // pure, so this only proves correctness, not call count. The resolver
    // unit tests in resolver.rs pin the memoization behavior directly; this
    // is the user-facing consequence: every reference is identical.
    let source = ".local $n = {$count :number}\n{$n}, {$n}, and {$n}";
    let mf = MessageFormat::new(source, MessageFormatOptions::default()).unwrap();
    let mut args = HashMap::new();
    args.insert("count".to_string(), RuntimeValue::Integer(7));
    assert_eq!(mf.format(&args), "7, 7, and 7");
}

#[test]
fn empty_message_formats_to_empty_string() {
    let mf = MessageFormat::new("", MessageFormatOptions::default()).unwrap();
    assert_eq!(mf.format(&HashMap::new()), "");
}

#[test]
fn empty_quoted_pattern_formats_to_empty_string() {
    let mf = MessageFormat::new("{{}}", MessageFormatOptions::default()).unwrap();
    assert_eq!(mf.format(&HashMap::new()), "");
}

#[test]
fn missing_variable_with_number_annotation_falls_back_and_reports_one_error() {
    let mf = MessageFormat::new("{$x :number}", MessageFormatOptions::default()).unwrap();
    let mut sink = CollectingSink::default();
    let out = mf.format_with_errors(&HashMap::new(), &mut sink);
    assert_eq!(out, "{$x}");
    assert_eq!(sink.errors.len(), 1);
    assert!(matches!(sink.errors[0], ResolutionError::UnresolvedVariable { .. }));
}

#[test]
fn duplicate_option_name_keeps_first_value_and_still_compiles() {
    let source = "{$amount :number style=percent style=currency currency=USD}";
    let mf = MessageFormat::new(source, MessageFormatOptions::default()).unwrap();
    assert_eq!(mf.parse_warnings().len(), 1);
    assert!(matches!(mf.parse_warnings()[0].kind, ParseErrorKind::DuplicateOptionName { .. }));
    let mut args = HashMap::new();
    args.insert("amount".to_string(), RuntimeValue::Float(0.5));
    assert_eq!(mf.format(&args), "50%");
}

#[test]
fn message_without_a_catchall_variant_is_rejected_at_construction() {
    let source = ".input {$x :number}\n.match $x\n1 {{one}}\n2 {{two}}";
    assert!(MessageFormat::new(source, MessageFormatOptions::default()).is_err());
}

#[test]
fn no_match_on_a_tolerantly_built_message_produces_empty_output() {
    // `parse_to_model` skips validation, so a select message missing its
    // catchall variant can still be handed to `from_message`. With no variant selectable and no
    // catchall to fall back on, resolution reports `no-match` and the
    // pattern is empty.
    let source = ".input {$x :number}\n.match $x\n1 {{one}}\n2 {{two}}";
    let (message, parse_errors) = MessageFormat::parse_to_model(source);
    assert!(parse_errors.is_empty());
    let mf = MessageFormat::from_message(source, message.unwrap(), MessageFormatOptions::default());
    let mut args = HashMap::new();
    args.insert("x".to_string(), RuntimeValue::Integer(5));
    let mut sink = CollectingSink::default();
    let out = mf.format_with_errors(&args, &mut sink);
    assert_eq!(out, "");
    assert!(sink.errors.iter().any(|e| matches!(e, ResolutionError::NoMatch)));
}

#[test]
fn idempotent_compilation_produces_identical_output() {
    let source = "Hello, {$name}! You have {$count :integer} messages.";
    let mut args = HashMap::new();
    args.insert("name".to_string(), RuntimeValue::String("Sam".into()));
    args.insert("count".to_string(), RuntimeValue::Integer(3));

    let a = MessageFormat::new(source, MessageFormatOptions::default()).unwrap().format(&args);
    let b = MessageFormat::new(source, MessageFormatOptions::default()).unwrap().format(&args);
    assert_eq!(a, b);
}
