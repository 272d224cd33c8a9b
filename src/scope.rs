//! Scope construction and declaration memoization.
//!
//! Express laziness as a `Unresolved -> Resolving -> Resolved` state
//! machine per declaration name, so a declaration referenced from several
//! places is only ever evaluated once. Grounded on `seq-compiler`'s
//! include-`Resolver`'s `HashSet` of
//! in-progress/seen paths (`included_files`) — here a `HashMap` keyed by
//! declaration name tracks the same three-state lifecycle instead of a
//! two-state seen/unseen one, since MF2 declarations need to tell
//! "currently resolving" (the cycle signal) apart from "done".

use crate::model::Declaration;
use crate::value::{MessageValue, RuntimeValue};
use std::cell::RefCell;
use std::collections::HashMap;

enum ThunkState {
    Resolving,
    Resolved(MessageValue),
}

/// What a caller finds when it asks about a declaration's thunk.
pub enum Check {
    /// Never referenced yet; caller should force it now.
    NotStarted,
    /// Already being forced higher up the call stack — a
    /// `cyclic-declaration` error.
    InProgress,
    /// Already forced and memoized; re-use without invoking the
    /// declaration's expression again.
    Done(MessageValue),
}

/// Per-call scope: the user's argument map plus the input/local
/// declarations of the message being formatted, with lazy,
/// memoized-on-first-force declaration values.
pub struct Scope<'a> {
    args: &'a HashMap<String, RuntimeValue>,
    declarations: HashMap<&'a str, &'a Declaration>,
    thunks: RefCell<HashMap<String, ThunkState>>,
}

impl<'a> Scope<'a> {
    pub fn new(args: &'a HashMap<String, RuntimeValue>, declarations: &'a [Declaration]) -> Self {
        let mut by_name = HashMap::new();
        for decl in declarations {
            let name = decl.name();
            if !name.is_empty() {
                by_name.insert(name, decl);
            }
        }
        Scope { args, declarations: by_name, thunks: RefCell::new(HashMap::new()) }
    }

    /// The caller-supplied value for `name`, before any declaration
    /// shadows it. Input declarations force-override this name with
    /// their own thunk; an unshadowed name is used directly.
    pub fn raw_arg(&self, name: &str) -> Option<&'a RuntimeValue> {
        self.args.get(name)
    }

    pub fn declaration(&self, name: &str) -> Option<&'a Declaration> {
        self.declarations.get(name).copied()
    }

    pub fn check(&self, name: &str) -> Check {
        match self.thunks.borrow().get(name) {
            None => Check::NotStarted,
            Some(ThunkState::Resolving) => Check::InProgress,
            Some(ThunkState::Resolved(v)) => Check::Done(v.clone()),
        }
    }

    pub fn begin_resolving(&self, name: &str) {
        self.thunks.borrow_mut().insert(name.to_string(), ThunkState::Resolving);
    }

    pub fn store_resolved(&self, name: &str, value: MessageValue) {
        self.thunks.borrow_mut().insert(name.to_string(), ThunkState::Resolved(value));
    }
}
