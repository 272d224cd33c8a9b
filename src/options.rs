//! Resolved options and the builder callers use to configure a
//! [`crate::MessageFormat`] instance.
//!
//! Grounded on `config.rs`'s `CompilerConfig`/`ExternalBuiltin` consuming
//! `with_*` builder — the same method-chaining shape, now assembling
//! locale/bidi/function choices instead of linker symbols.

use crate::locale::LocaleMatcher;
use crate::registry::{FunctionRegistry, MessageFunction};
use crate::value::Direction;
use std::sync::Arc;

/// Whether resolved values get wrapped in bidi isolate characters when
/// their direction differs from the message's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidiIsolation {
    /// Wrap a value whose direction differs from the message's in the
    /// matching isolate pair (LRI/RLI/FSI ... PDI).
    Default,
    /// Never wrap; callers take on responsibility for bidi safety
    /// themselves.
    None,
}

impl Default for BidiIsolation {
    fn default() -> Self {
        BidiIsolation::Default
    }
}

/// Construction-time configuration for a [`crate::MessageFormat`],
/// consumed by its constructors.
#[derive(Clone)]
pub struct MessageFormatOptions {
    pub(crate) locales: Vec<String>,
    pub(crate) bidi_isolation: BidiIsolation,
    /// An explicit override for the message's own base direction; `None`
    /// means derive it from the primary locale.
    pub(crate) direction: Option<Direction>,
    pub(crate) locale_matcher: LocaleMatcher,
    pub(crate) functions: FunctionRegistry,
    /// §4.1's opt-in escape set (`\n`, `\xHH`, ...) and newline/indent
    /// collapsing, for sources loaded from a resource-file format rather
    /// than embedded inline. Off by default.
    pub(crate) resource_mode: bool,
}

impl Default for MessageFormatOptions {
    fn default() -> Self {
        MessageFormatOptions {
            locales: vec!["en".to_string()],
            bidi_isolation: BidiIsolation::default(),
            direction: None,
            locale_matcher: LocaleMatcher::default(),
            functions: FunctionRegistry::default(),
            resource_mode: false,
        }
    }
}

impl MessageFormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the requested locale list.
    pub fn with_locales(mut self, locales: Vec<String>) -> Self {
        self.locales = locales;
        self
    }

    pub fn with_bidi_isolation(mut self, policy: BidiIsolation) -> Self {
        self.bidi_isolation = policy;
        self
    }

    /// Force the message's base direction instead of deriving it from the
    /// primary locale.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_locale_matcher(mut self, matcher: LocaleMatcher) -> Self {
        self.locale_matcher = matcher;
        self
    }

    /// Enable §4.1's opt-in escape set and newline/indent collapsing for
    /// text and quoted literals alike.
    pub fn with_resource_mode(mut self, resource_mode: bool) -> Self {
        self.resource_mode = resource_mode;
        self
    }

    /// Register a function, overriding any built-in or previously
    /// registered function of the same name (last registration wins, same
    /// as `registry.rs::FunctionRegistry::with_function`).
    pub fn with_function(mut self, name: &str, f: Arc<dyn MessageFunction>) -> Self {
        self.functions = self.functions.with_function(name, f);
        self
    }
}

/// What `MessageFormat::resolved_options()` reports back to a caller:
/// the options actually in force, with ambiguity resolved.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub locales: Vec<String>,
    pub bidi_isolation: BidiIsolation,
    pub direction: Direction,
    pub locale_matcher: LocaleMatcher,
    /// Names of every function available for this instance, built-in and
    /// host-registered alike, sorted for stable output.
    pub function_names: Vec<String>,
}
