//! # Token
//!
//! Defines the token record emitted by the tokenizer engine.
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;

/// A classified, contiguous substring of the input, tagged with the name of
/// the rule that matched it.
///
/// Token kinds are shared `Arc<str>` handles into the engine's rule table, so
/// cloning a token never re-allocates the rule name. Concatenating the values
/// of all matched tokens (ignored ones included, before filtering) reproduces
/// the original input exactly.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Token {
    /// Name of the rule that produced this token, e.g. `"number"`.
    pub kind: Arc<str>,

    /// The exact substring of the input this token covers.
    pub value: String,
}

impl Token {
    /// Construct a token from a rule name and the matched substring.
    pub fn new<V: Into<String>>(kind: Arc<str>, value: V) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Whether this token was produced by the rule named `kind`.
    #[must_use]
    pub fn is(&self, kind: &str) -> bool {
        &*self.kind == kind
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.kind, self.value)
    }
}
