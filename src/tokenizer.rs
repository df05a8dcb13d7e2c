//! # Incremental Tokenizer
//!
//! Rule-driven incremental tokenization of chunked text streams, plus the
//! JSON lexical grammar registered on top of the engine.
pub mod engine;
pub mod json;
pub mod rules;
pub mod stream;
pub mod token;

// Re-exports
pub use engine::{TokenizeError, Tokenizer};
pub use json::json_tokenizer;
pub use rules::{BuiltinRule, ConfigurationError, Rule, RuleKind};
pub use stream::{ChunkedTokenStream, DEFAULT_CHUNK_SIZE, StreamError};
pub use token::Token;
