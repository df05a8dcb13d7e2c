/*!
# JSON Grammar Adapter

Static configuration layer registering JSON's lexical grammar on the
incremental engine. No algorithm lives here; every hard case (strings split
across chunks, numbers that may still grow, `true` vs a bare word) is
resolved by the engine's matching loop.

Rule table, in priority order:

| name           | matches                                            |
|----------------|----------------------------------------------------|
| `comma`        | `,`                                                |
| `end-label`    | `:`                                                |
| `begin-object` | `{`                                                |
| `end-object`   | `}`                                                |
| `begin-array`  | `[`                                                |
| `end-array`    | `]`                                                |
| `string`       | double-quoted, escaped-quote aware                 |
| `maybe-string` | unterminated string prefix (never emits)           |
| `null`         | `null`                                             |
| `boolean`      | `true` or `false`                                  |
| `number`       | optional minus, integer part, optional fraction    |
| `maybe-number` | bare minus or digits-then-dot prefix (never emits) |
| `symbol`       | bare word fallback                                 |
| `whitespace`   | builtin, ignored                                   |

A trailing dot is not a complete number: `"1."` commits `1` and leaves the
dot unmatched. String token values keep their surrounding quotes.
*/
use crate::tokenizer::engine::{TokenizeError, Tokenizer};
use crate::tokenizer::rules::{BuiltinRule, ConfigurationError};
use crate::tokenizer::token::Token;

fn build() -> Result<Tokenizer, ConfigurationError> {
    let mut t = Tokenizer::new();
    t.add_rule(",", "comma")?;
    t.add_rule(":", "end-label")?;
    t.add_rule(r"\{", "begin-object")?;
    t.add_rule(r"\}", "end-object")?;
    t.add_rule(r"\[", "begin-array")?;
    t.add_rule(r"\]", "end-array")?;
    t.add_rule(r#""(?:[^"\\]|\\.)*""#, "string")?;
    t.add_prefix_rule(r#""(?:[^"\\]|\\.)*\\?"#, "maybe-string")?;
    t.add_rule("null", "null")?;
    t.add_rule("true|false", "boolean")?;
    t.add_rule(r"-?[0-9]+(?:\.[0-9]+)?", "number")?;
    t.add_prefix_rule(r"-|-?[0-9]+\.", "maybe-number")?;
    t.add_rule("[A-Za-z_][A-Za-z0-9_]*", "symbol")?;
    t.add_builtin_rule(BuiltinRule::Whitespace)?;
    t.ignore("whitespace")?;
    Ok(t)
}

/// A fresh tokenizer configured with the JSON rule table, whitespace
/// ignored. Ready for `push`/`end` or a [`ChunkedTokenStream`].
///
/// [`ChunkedTokenStream`]: crate::tokenizer::ChunkedTokenStream
#[must_use]
pub fn json_tokenizer() -> Tokenizer {
    build().expect("JSON rule table is statically valid")
}

/// Tokenize a complete in-memory JSON document in one call.
///
/// # Errors
///
/// [`TokenizeError`] for malformed or truncated input.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    json_tokenizer().end_with(input)
}
