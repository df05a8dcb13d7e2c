/*!
# `chunklex` Library

Incremental, rule-based tokenization of chunked text streams.

Register declarative token rules on a [`tokenizer::Tokenizer`], feed input in
chunks of any size, and receive the same token sequence regardless of where
the chunk boundaries fall. A ready-made JSON tokenizer is available via
[`tokenizer::json_tokenizer`].
*/

pub mod commands;
pub mod tokenizer;
