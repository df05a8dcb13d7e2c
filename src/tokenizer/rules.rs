/*!
# Token Rules

Declarative rules classifying candidate substrings for the tokenizer engine.

Every rule carries a name (the token type it produces) and a matcher that
classifies a candidate string. A *complete* rule matches only when the
candidate is exactly a whole, valid token — its pattern is anchored at both
ends, never a prefix test. A *prefix* rule matches only when the candidate is
a valid prefix of some longer, not-yet-complete token; prefix rules never
emit tokens themselves, they only tell the engine that waiting for more input
may still pay off.

A well-formed rule set never claims the same candidate with both a complete
and a prefix rule; the engine checks complete rules first, so a complete
match always wins the emission decision.
*/
use log::trace;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Whether a rule recognizes whole tokens or growable prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Recognizes a complete, final token.
    Complete,
    /// Recognizes a prefix that could still grow into a longer token.
    /// Never emits.
    Prefix,
}

/// Pattern-free rules provided by the engine itself.
///
/// Builtins are ordinary immutable rule values constructed per instance;
/// there is no process-wide rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinRule {
    /// One or more whitespace characters (`char::is_whitespace`).
    Whitespace,
}

impl BuiltinRule {
    /// The rule name a builtin registers under.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Whitespace => "whitespace",
        }
    }
}

/// How a rule decides whether a candidate belongs to it.
#[derive(Debug, Clone)]
enum Matcher {
    /// Anchored regular expression, compiled once at registration.
    Pattern(Regex),
    /// Hand-written whitespace classifier backing [`BuiltinRule::Whitespace`].
    Whitespace,
}

/// A single named token rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: Arc<str>,
    kind: RuleKind,
    matcher: Matcher,
}

impl Rule {
    /// Compile a rule from a regex pattern. The pattern is anchored as
    /// `^(?:pattern)$` so it can only ever claim the whole candidate.
    pub(crate) fn from_pattern(
        pattern: &str,
        name: &str,
        kind: RuleKind,
    ) -> Result<Self, ConfigurationError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|source| {
            ConfigurationError::InvalidPattern {
                name: name.to_string(),
                source,
            }
        })?;
        trace!("compiled rule {name:?} ({kind:?}) from /{pattern}/");
        Ok(Self {
            name: Arc::from(name),
            kind,
            matcher: Matcher::Pattern(regex),
        })
    }

    /// Construct one of the builtin rules.
    pub(crate) fn builtin(builtin: BuiltinRule) -> Self {
        match builtin {
            BuiltinRule::Whitespace => Self {
                name: Arc::from(builtin.name()),
                kind: RuleKind::Complete,
                matcher: Matcher::Whitespace,
            },
        }
    }

    /// The token type this rule produces.
    #[must_use]
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Complete or prefix classification of this rule.
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Whether `candidate` is claimed by this rule.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(regex) => regex.is_match(candidate),
            Matcher::Whitespace => {
                !candidate.is_empty()
                    && candidate.chars().all(char::is_whitespace)
            }
        }
    }
}

/// Errors raised while configuring a tokenizer, before any input is fed.
///
/// All variants are raised synchronously at the offending call.
#[derive(Debug, Clone)]
pub enum ConfigurationError {
    /// A rule with this name is already registered.
    DuplicateRule(String),
    /// `ignore` referenced a rule name that was never registered.
    UnknownIgnoreTarget(String),
    /// Rules and ignores are frozen once streaming starts; this carries the
    /// name passed to the late call.
    AlreadyStarted(String),
    /// The rule pattern failed to compile.
    InvalidPattern {
        /// Name the rule would have registered under.
        name: String,
        /// Underlying regex compilation error.
        source: regex::Error,
    },
}

impl Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRule(name) => {
                write!(f, "duplicate rule name: {name:?}")
            }
            Self::UnknownIgnoreTarget(name) => {
                write!(f, "cannot ignore unregistered rule: {name:?}")
            }
            Self::AlreadyStarted(name) => {
                write!(
                    f,
                    "cannot register {name:?}: streaming already started"
                )
            }
            Self::InvalidPattern { name, source } => {
                write!(f, "invalid pattern for rule {name:?}: {source}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_rule_is_anchored() {
        let rule = Rule::from_pattern("[0-9]+", "number", RuleKind::Complete)
            .expect("valid pattern");
        assert!(rule.matches("123"));
        // Anchoring means a prefix or suffix match is not a match.
        assert!(!rule.matches("123abc"));
        assert!(!rule.matches("abc123"));
        assert!(!rule.matches(""));
    }

    #[test]
    fn test_prefix_rule_kind() {
        let rule = Rule::from_pattern("-", "maybe-number", RuleKind::Prefix)
            .expect("valid pattern");
        assert_eq!(rule.kind(), RuleKind::Prefix);
        assert!(rule.matches("-"));
        assert!(!rule.matches("-1"));
    }

    #[test]
    fn test_builtin_whitespace() {
        let rule = Rule::builtin(BuiltinRule::Whitespace);
        assert_eq!(&**rule.name(), "whitespace");
        assert!(rule.matches(" "));
        assert!(rule.matches(" \t\r\n "));
        assert!(!rule.matches(""));
        assert!(!rule.matches(" x"));
    }

    #[test]
    fn test_invalid_pattern_reported() {
        let result = Rule::from_pattern("(", "broken", RuleKind::Complete);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidPattern { .. })
        ));
    }
}
