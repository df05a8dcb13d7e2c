/*!
# Incremental Tokenizer Engine

Stateful maximal-munch matcher that turns arbitrarily chunked text into an
ordered token sequence.

The engine owns a bounded buffer of unconsumed input and grows a candidate
substring one character at a time. Whenever a complete rule matches the
candidate, the match is recorded as the best committed match for the current
start offset; a longer complete match found later always supersedes it, and
registration order breaks ties only at equal length. Prefix rules keep growth
alive without committing anything. When no rule matches any further growth,
the best committed match is emitted and matching restarts on the remainder.

Running out of buffered input mid-candidate is not an error: the engine
pauses and resumes when the next chunk arrives, so a chunk boundary inside
`"123"` never finalizes the token before `".456"` shows up. [`Tokenizer::end`]
performs the final flush once the caller knows no more input is coming.

The buffer never holds more than the longest currently-unresolved candidate;
memory use is independent of how much input has already been consumed.

## Example

```rust
use chunklex::tokenizer::Tokenizer;

let mut t = Tokenizer::new();
t.add_rule("-?[0-9]+(?:\\.[0-9]+)?", "number").unwrap();
t.add_prefix_rule("-|-?[0-9]+\\.", "maybe-number").unwrap();
t.add_rule(",", "comma").unwrap();

let mut tokens = t.push("12").unwrap();
tokens.extend(t.push("3.45,6").unwrap());
tokens.extend(t.end().unwrap());

let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
assert_eq!(values, ["123.45", ",", "6"]);
```
*/
use log::{debug, trace};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::tokenizer::rules::{BuiltinRule, ConfigurationError, Rule, RuleKind};
use crate::tokenizer::token::Token;

/// Terminal tokenization failures.
///
/// Both variants carry the byte offset (into the whole stream) where the
/// failing candidate starts and the unmatched text for diagnostics. Once one
/// of these is returned, the instance is dead: every later `push`/`end` call
/// reports the same error. Recovery is the caller's job — construct a fresh
/// instance at a self-chosen later offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// No rule, complete or prefix, matches any growth of the current
    /// candidate.
    NoMatch {
        /// Byte offset of the candidate start within the stream.
        offset: usize,
        /// The candidate text that nothing matched.
        context: String,
    },
    /// The stream ended mid-candidate with no committed match to emit.
    UnexpectedEndOfInput {
        /// Byte offset of the candidate start within the stream.
        offset: usize,
        /// The unconsumed tail of the input.
        context: String,
    },
}

impl Error for TokenizeError {}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch { offset, context } => {
                write!(f, "no rule matches {context:?} at byte {offset}")
            }
            Self::UnexpectedEndOfInput { offset, context } => {
                write!(
                    f,
                    "unexpected end of input at byte {offset}: unresolved {context:?}"
                )
            }
        }
    }
}

/// An incremental, rule-driven tokenizer.
///
/// Lifecycle has two phases. During configuration, rules are registered with
/// [`add_rule`](Self::add_rule) / [`add_prefix_rule`](Self::add_prefix_rule)
/// / [`add_builtin_rule`](Self::add_builtin_rule) and token types are marked
/// ignored with [`ignore`](Self::ignore). The first [`push`](Self::push) or
/// [`end`](Self::end) call freezes the configuration; late mutation fails
/// with [`ConfigurationError::AlreadyStarted`].
///
/// Tokens come back from `push`/`end` in stream order with ignored types
/// already filtered out. Chunk boundaries never affect the emitted sequence.
/// Instances share no state; each one may live on its own thread, and
/// dropping one mid-stream needs no cleanup beyond memory release.
#[derive(Debug, Default)]
pub struct Tokenizer {
    /// Registration order doubles as match-priority order.
    rules: Vec<Rule>,
    /// Token types consumed but never surfaced.
    ignored: HashSet<Arc<str>>,
    /// Unconsumed input suffix.
    buf: String,
    /// Byte length of the candidate prefix of `buf` examined so far.
    cand_len: usize,
    /// Longest committed complete match for the current start offset:
    /// (rule index, byte length).
    last_good: Option<(usize, usize)>,
    /// A prefix rule matched the current candidate at some length.
    pending_prefix: bool,
    /// Resolved tokens not yet handed to the caller.
    ready: Vec<Token>,
    /// Bytes emitted so far; absolute stream offset of `buf[0]`.
    consumed: usize,
    /// Set by the first `push`/`end`; freezes configuration.
    started: bool,
    /// Set by a successful `end`; later pushes are caller error and ignored.
    finished: bool,
    /// Terminal error latch.
    failed: Option<TokenizeError>,
}

impl Tokenizer {
    /// Create a tokenizer with zero rules registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a complete rule: `pattern` (anchored implicitly) must match
    /// exactly a whole token of type `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError`] on a duplicate name, an invalid pattern, or a
    /// call after streaming has started.
    pub fn add_rule(
        &mut self,
        pattern: &str,
        name: &str,
    ) -> Result<(), ConfigurationError> {
        let rule = Rule::from_pattern(pattern, name, RuleKind::Complete)?;
        self.register(rule)
    }

    /// Register a prefix rule: `pattern` must match only valid prefixes of
    /// longer, not-yet-complete tokens. Prefix rules never emit; they keep
    /// candidate growth alive across chunk boundaries.
    ///
    /// # Errors
    ///
    /// Same conditions as [`add_rule`](Self::add_rule).
    pub fn add_prefix_rule(
        &mut self,
        pattern: &str,
        name: &str,
    ) -> Result<(), ConfigurationError> {
        let rule = Rule::from_pattern(pattern, name, RuleKind::Prefix)?;
        self.register(rule)
    }

    /// Register one of the pattern-free builtin rules under its fixed name.
    ///
    /// # Errors
    ///
    /// Same conditions as [`add_rule`](Self::add_rule).
    pub fn add_builtin_rule(
        &mut self,
        builtin: BuiltinRule,
    ) -> Result<(), ConfigurationError> {
        self.register(Rule::builtin(builtin))
    }

    /// Mark a registered rule name as ignored: its tokens are consumed and
    /// advance the stream but are never surfaced.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError`] if `name` is unregistered or streaming has
    /// started.
    pub fn ignore(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.started {
            return Err(ConfigurationError::AlreadyStarted(name.to_string()));
        }
        let rule = self
            .rules
            .iter()
            .find(|rule| &**rule.name() == name)
            .ok_or_else(|| {
                ConfigurationError::UnknownIgnoreTarget(name.to_string())
            })?;
        self.ignored.insert(rule.name().clone());
        Ok(())
    }

    fn register(&mut self, rule: Rule) -> Result<(), ConfigurationError> {
        if self.started {
            return Err(ConfigurationError::AlreadyStarted(
                rule.name().to_string(),
            ));
        }
        if self.rules.iter().any(|r| r.name() == rule.name()) {
            return Err(ConfigurationError::DuplicateRule(
                rule.name().to_string(),
            ));
        }
        debug!("registered rule {:?} ({:?})", rule.name(), rule.kind());
        self.rules.push(rule);
        Ok(())
    }

    /// Feed the next chunk of input, returning the tokens it resolved, in
    /// order, with ignored types omitted. Chunks may be of any size,
    /// including empty; chunk boundaries never change the emitted sequence.
    ///
    /// # Errors
    ///
    /// [`TokenizeError::NoMatch`] when some candidate cannot be matched by
    /// any rule. The error is terminal for this instance; tokens resolved
    /// before the failure remain retrievable via
    /// [`pending_tokens`](Self::pending_tokens).
    pub fn push(&mut self, chunk: &str) -> Result<Vec<Token>, TokenizeError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.finished {
            // Pushing after end() is a caller ordering error; the chunk is
            // dropped rather than spliced into a completed stream.
            debug!("push after end ignored ({} bytes)", chunk.len());
            return Ok(Vec::new());
        }
        self.started = true;
        self.buf.push_str(chunk);
        trace!(
            "push {} bytes, buffer now {} bytes at offset {}",
            chunk.len(),
            self.buf.len(),
            self.consumed
        );
        self.advance(false)?;
        Ok(std::mem::take(&mut self.ready))
    }

    /// Signal end of input and flush any pending candidate. A committed
    /// match is emitted even if a prefix rule was still hoping for more
    /// input; nothing can grow further.
    ///
    /// # Errors
    ///
    /// [`TokenizeError::UnexpectedEndOfInput`] when unconsumed input remains
    /// with no committed match, [`TokenizeError::NoMatch`] when a remainder
    /// after the last committed match is unmatchable.
    pub fn end(&mut self) -> Result<Vec<Token>, TokenizeError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.finished {
            return Ok(Vec::new());
        }
        self.started = true;
        self.advance(true)?;
        self.finished = true;
        debug!("stream complete after {} bytes", self.consumed);
        Ok(std::mem::take(&mut self.ready))
    }

    /// [`end`](Self::end) with one last chunk, fed immediately before the
    /// flush.
    ///
    /// # Errors
    ///
    /// Union of the [`push`](Self::push) and [`end`](Self::end) conditions.
    pub fn end_with(
        &mut self,
        final_chunk: &str,
    ) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = self.push(final_chunk)?;
        tokens.extend(self.end()?);
        Ok(tokens)
    }

    /// Drain tokens that were resolved but not yet handed out. Only
    /// non-empty after a call that returned a terminal error part-way
    /// through a chunk; lets a consumer deliver every token that precedes
    /// the failure exactly once.
    pub fn pending_tokens(&mut self) -> Vec<Token> {
        std::mem::take(&mut self.ready)
    }

    /// Core matching loop. Grows the candidate over the buffered input,
    /// emitting into `ready` and restarting as matches resolve. With
    /// `at_end` unset, an exhausted buffer pauses the loop; with it set,
    /// the buffer must resolve completely.
    fn advance(&mut self, at_end: bool) -> Result<(), TokenizeError> {
        loop {
            if self.cand_len == self.buf.len() {
                if self.buf.is_empty() {
                    return Ok(());
                }
                if !at_end {
                    // Mid-candidate at the buffer edge: the next chunk may
                    // still extend the match, so wait rather than finalize.
                    trace!(
                        "paused at offset {} with {} buffered bytes",
                        self.consumed,
                        self.buf.len()
                    );
                    return Ok(());
                }
                if let Some((idx, len)) = self.last_good {
                    if self.pending_prefix {
                        trace!("end of input overrides pending prefix");
                    }
                    self.emit(idx, len);
                    continue;
                }
                return Err(self.fail(TokenizeError::UnexpectedEndOfInput {
                    offset: self.consumed,
                    context: self.buf.clone(),
                }));
            }

            let Some(next) = self.buf[self.cand_len..].chars().next() else {
                return Ok(()); // candidate edge is always a char boundary
            };
            self.cand_len += next.len_utf8();
            let candidate = &self.buf[..self.cand_len];

            let mut complete = None;
            let mut prefix = false;
            for (idx, rule) in self.rules.iter().enumerate() {
                if !rule.matches(candidate) {
                    continue;
                }
                match rule.kind() {
                    // First complete rule in registration order wins ties
                    // at this length; a longer match later still supersedes.
                    RuleKind::Complete => {
                        complete = Some(idx);
                        break;
                    }
                    RuleKind::Prefix => prefix = true,
                }
            }

            if let Some(idx) = complete {
                self.last_good = Some((idx, self.cand_len));
            } else if prefix {
                self.pending_prefix = true;
            } else {
                // Nothing matches this growth; the candidate is settled.
                if let Some((idx, len)) = self.last_good {
                    self.emit(idx, len);
                } else {
                    let context = candidate.to_string();
                    return Err(self.fail(TokenizeError::NoMatch {
                        offset: self.consumed,
                        context,
                    }));
                }
            }
        }
    }

    /// Emit the committed match, advance past it, and reset per-token state.
    /// Ignored tokens advance the stream identically but are not surfaced.
    fn emit(&mut self, rule_idx: usize, len: usize) {
        let name = self.rules[rule_idx].name().clone();
        let value: String = self.buf.drain(..len).collect();
        self.consumed += len;
        self.cand_len = 0;
        self.last_good = None;
        self.pending_prefix = false;
        if self.ignored.contains(&name) {
            trace!("ignored {name} token ({len} bytes)");
        } else {
            trace!("emit {name} token ({len} bytes)");
            self.ready.push(Token::new(name, value));
        }
    }

    /// Latch a terminal error so later calls report the same failure.
    fn fail(&mut self, err: TokenizeError) -> TokenizeError {
        debug!("terminal error: {err}");
        self.failed = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Number/comma rule set used across the engine tests, whitespace
    /// ignored.
    fn number_tokenizer() -> Tokenizer {
        let mut t = Tokenizer::new();
        t.add_rule("-?[0-9]+(?:\\.[0-9]+)?", "number").unwrap();
        t.add_prefix_rule("-|-?[0-9]+\\.", "maybe-number").unwrap();
        t.add_rule(",", "comma").unwrap();
        t.add_builtin_rule(BuiltinRule::Whitespace).unwrap();
        t.ignore("whitespace").unwrap();
        t
    }

    fn collect(t: &mut Tokenizer, chunks: &[&str]) -> Vec<Token> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(t.push(chunk).expect("push should succeed"));
        }
        out.extend(t.end().expect("end should succeed"));
        out
    }

    fn kinds_and_values(tokens: &[Token]) -> Vec<(String, String)> {
        tokens
            .iter()
            .map(|t| (t.kind.to_string(), t.value.clone()))
            .collect()
    }

    #[test]
    fn test_maximal_munch() {
        let mut t = number_tokenizer();
        let tokens = collect(&mut t, &["123.45"]);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is("number"));
        assert_eq!(tokens[0].value, "123.45");
    }

    #[test]
    fn test_chunk_boundary_inside_number() {
        let mut t = number_tokenizer();
        let tokens = collect(&mut t, &["12", "3.45"]);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].value, "123.45");
    }

    #[test]
    fn test_chunking_determinism() {
        let input = "1, -2.5,3 ,44.0, 5";
        let chunkings: &[&[&str]] = &[
            &[input],
            &["1, -2.5", ",3 ,44.0, 5"],
            &["1", ", ", "-", "2.5,3 ,", "44", ".", "0, 5"],
        ];
        let mut sequences = Vec::new();
        for chunks in chunkings {
            let mut t = number_tokenizer();
            sequences.push(kinds_and_values(&collect(&mut t, chunks)));
        }
        assert_eq!(sequences[0], sequences[1]);
        assert_eq!(sequences[0], sequences[2]);
    }

    #[test]
    fn test_coverage_reproduces_input() {
        // No ignores: concatenated token values must reproduce the input.
        let mut t = Tokenizer::new();
        t.add_rule("-?[0-9]+(?:\\.[0-9]+)?", "number").unwrap();
        t.add_prefix_rule("-|-?[0-9]+\\.", "maybe-number").unwrap();
        t.add_rule(",", "comma").unwrap();
        t.add_builtin_rule(BuiltinRule::Whitespace).unwrap();

        let input = "1, -2.5 ,3";
        let tokens = collect(&mut t, &[input]);
        let rebuilt: String =
            tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_ignore_filtering() {
        let mut t = number_tokenizer();
        let tokens = collect(&mut t, &["1, 2,3"]);
        assert_eq!(
            kinds_and_values(&tokens),
            vec![
                ("number".into(), "1".into()),
                ("comma".into(), ",".into()),
                ("number".into(), "2".into()),
                ("comma".into(), ",".into()),
                ("number".into(), "3".into()),
            ]
        );
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut t = Tokenizer::new();
        t.add_rule("true|false", "boolean").unwrap();
        t.add_rule("[a-z]+", "symbol").unwrap();
        let tokens = collect(&mut t, &["true"]);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is("boolean"));

        // Reversed registration flips the winner.
        let mut t = Tokenizer::new();
        t.add_rule("[a-z]+", "symbol").unwrap();
        t.add_rule("true|false", "boolean").unwrap();
        let tokens = collect(&mut t, &["true"]);
        assert!(tokens[0].is("symbol"));
    }

    #[test]
    fn test_longer_match_beats_earlier_rule() {
        // "truest" is a symbol even though boolean matched "true" first.
        let mut t = Tokenizer::new();
        t.add_rule("true|false", "boolean").unwrap();
        t.add_rule("[a-z]+", "symbol").unwrap();
        let tokens = collect(&mut t, &["truest"]);
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is("symbol"));
        assert_eq!(tokens[0].value, "truest");
    }

    #[test]
    fn test_no_match_is_terminal() {
        let mut t = number_tokenizer();
        let err = t.push("1,x").expect_err("x matches nothing");
        match &err {
            TokenizeError::NoMatch { offset, context } => {
                assert_eq!(*offset, 2);
                assert_eq!(context, "x");
            }
            other => panic!("expected NoMatch, got {other:?}"),
        }
        // Tokens resolved before the failure are still deliverable.
        let pending = t.pending_tokens();
        assert_eq!(
            kinds_and_values(&pending),
            vec![
                ("number".into(), "1".into()),
                ("comma".into(), ",".into()),
            ]
        );
        // Latched: the same terminal error comes back on every later call.
        assert_eq!(t.push("1"), Err(err.clone()));
        assert_eq!(t.end(), Err(err));
    }

    #[test]
    fn test_truncated_prefix_only_input() {
        // A bare minus only ever matches the prefix rule.
        let mut t = number_tokenizer();
        assert!(t.push("-").unwrap().is_empty());
        let err = t.end().expect_err("nothing committed");
        match err {
            TokenizeError::UnexpectedEndOfInput { offset, context } => {
                assert_eq!(offset, 0);
                assert_eq!(context, "-");
            }
            other => panic!("expected UnexpectedEndOfInput, got {other:?}"),
        }
    }

    #[test]
    fn test_end_emits_despite_pending_prefix() {
        // "123." leaves a pending prefix; end() must still emit "123" and
        // then reject the dangling dot.
        let mut t = number_tokenizer();
        assert!(t.push("123.").unwrap().is_empty());
        let err = t.end().expect_err("dangling dot is unmatchable");
        assert!(matches!(err, TokenizeError::NoMatch { offset: 3, .. }));
        assert_eq!(t.pending_tokens()[0].value, "123");
    }

    #[test]
    fn test_end_with_final_chunk() {
        let mut t = number_tokenizer();
        let mut tokens = t.push("1,").unwrap();
        tokens.extend(t.end_with("2").unwrap());
        assert_eq!(
            kinds_and_values(&tokens),
            vec![
                ("number".into(), "1".into()),
                ("comma".into(), ",".into()),
                ("number".into(), "2".into()),
            ]
        );
    }

    #[test]
    fn test_empty_stream() {
        let mut t = number_tokenizer();
        assert!(t.push("").unwrap().is_empty());
        assert!(t.end().unwrap().is_empty());
    }

    #[test]
    fn test_configuration_frozen_after_start() {
        let mut t = number_tokenizer();
        t.push("1").unwrap();
        assert!(matches!(
            t.add_rule("x", "extra"),
            Err(ConfigurationError::AlreadyStarted(_))
        ));
        assert!(matches!(
            t.ignore("comma"),
            Err(ConfigurationError::AlreadyStarted(_))
        ));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut t = Tokenizer::new();
        t.add_rule("[0-9]+", "number").unwrap();
        assert!(matches!(
            t.add_rule("[0-9]+", "number"),
            Err(ConfigurationError::DuplicateRule(_))
        ));
        assert!(matches!(
            t.add_prefix_rule("-", "number"),
            Err(ConfigurationError::DuplicateRule(_))
        ));
    }

    #[test]
    fn test_unknown_ignore_target_rejected() {
        let mut t = Tokenizer::new();
        t.add_rule("[0-9]+", "number").unwrap();
        assert!(matches!(
            t.ignore("whitespace"),
            Err(ConfigurationError::UnknownIgnoreTarget(_))
        ));
    }

    #[test]
    fn test_multibyte_input() {
        let mut t = Tokenizer::new();
        t.add_rule("[0-9]+", "number").unwrap();
        t.add_rule("°", "degree").unwrap();
        let mut tokens = t.push("42").unwrap();
        tokens.extend(t.end_with("°").unwrap());
        assert_eq!(
            kinds_and_values(&tokens),
            vec![
                ("number".into(), "42".into()),
                ("degree".into(), "°".into()),
            ]
        );
    }

    #[test]
    fn test_scale_many_small_tokens() {
        // 100k comma-separated integers; the buffer drains per emission, so
        // it stays proportional to the longest single token.
        let mut t = number_tokenizer();
        let mut count = 0usize;
        for i in 0..100_000_u32 {
            let chunk = format!("{},", i % 1000);
            count += t.push(&chunk).unwrap().len();
            assert!(t.buf.len() <= 8, "buffer should stay near-empty");
        }
        count += t.end_with("0").unwrap().len();
        // 100k numbers + 100k commas + the final number.
        assert_eq!(count, 200_001);
    }
}
