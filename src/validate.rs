//! Structural validation: the pure function that decides
//! whether a lowered [`crate::model::Message`] is fit to resolve.
//!
//! Grounded on `seq-compiler`'s `Program::validate_word_calls_with_externals`
//! shape — a pure function taking an already-built tree and returning a
//! `Result`/error list rather than failing during construction, so tooling
//! that wants the partial model can still get it.

use crate::errors::ValidationError;
use crate::model::{Declaration, Message, Operand, SelectMessage, Variant};

/// Every structural invariant a message must satisfy to be resolvable.
/// Accumulates every violation rather than
/// stopping at the first — callers decide what to do with a non-empty
/// list.
pub fn validate(message: &Message) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    // One name set across both declaration kinds: a `.local` re-using an
    // already-declared `.input` name (or vice versa) is still a
    // redeclaration, not two independent namespaces.
    let mut seen_names = std::collections::HashSet::new();

    for decl in message.declarations() {
        match decl {
            Declaration::Local(l) => {
                if !seen_names.insert(l.name.clone()) {
                    errors.push(ValidationError::DuplicateLocalDeclaration { name: l.name.clone() });
                }
            }
            Declaration::Input(i) => {
                if let Some(Operand::Variable(v)) = &i.expr.arg {
                    if !seen_names.insert(v.name.clone()) {
                        errors.push(ValidationError::RedeclaredInput { name: v.name.clone() });
                    }
                }
            }
        }
    }

    if let Message::Select(m) = message {
        for selector in &m.selectors {
            let name = SelectMessage::selector_name(selector).unwrap_or("").to_string();
            let annotated = selector.has_function_annotation() || is_transitively_annotated(&m.declarations, &name);
            if !annotated {
                errors.push(ValidationError::MissingSelectorAnnotation { selector: name });
            }
        }

        let expected_arity = m.selectors.len();
        for variant in &m.variants {
            if variant.keys.len() != expected_arity {
                errors.push(ValidationError::VariantArityMismatch { expected: expected_arity, found: variant.keys.len() });
            }
        }

        if !m.variants.iter().any(Variant::is_all_catchall) {
            errors.push(ValidationError::MissingFallbackVariant);
        }
    }

    errors
}

/// Whether `name` is annotated with a function, directly or by following a
/// chain of `.local`/`.input` declarations (`$c` annotated through `$a` via
/// `.local $c = {$a}`). Stops and reports "not annotated" on a cycle rather
/// than looping forever; a cyclic declaration is already invalid on its own
/// terms and is reported separately at resolution time.
fn is_transitively_annotated(declarations: &[Declaration], name: &str) -> bool {
    let mut visited = std::collections::HashSet::new();
    let mut current = name.to_string();
    loop {
        if !visited.insert(current.clone()) {
            return false;
        }
        match declarations.iter().find(|d| d.name() == current) {
            Some(Declaration::Input(i)) => return i.expr.has_function_annotation(),
            Some(Declaration::Local(l)) => {
                if l.expr.has_function_annotation() {
                    return true;
                }
                match &l.expr.arg {
                    Some(Operand::Variable(v)) => current = v.name.clone(),
                    _ => return false,
                }
            }
            None => return false,
        }
    }
}
