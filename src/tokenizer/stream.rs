/*!
# Chunked Token Stream

Reader-driven iterator adapter over a [`Tokenizer`].

Pulls fixed-size chunks from any [`Read`] source, feeds them through the
engine, and yields tokens lazily so a consumer can act on early tokens long
before the source is exhausted. Chunk reads are byte-oriented, so a read may
split a multi-byte UTF-8 scalar; the incomplete tail is held back and stitched
onto the next chunk.

A terminal [`TokenizeError`] is yielded after every token that precedes it,
then the iterator fuses.
*/
use log::trace;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::io::{self, Read};

use crate::tokenizer::engine::{TokenizeError, Tokenizer};
use crate::tokenizer::token::Token;

/// Default read size, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Failures surfaced by a [`ChunkedTokenStream`].
#[derive(Debug)]
pub enum StreamError {
    /// Reading the underlying source failed.
    Io(io::Error),
    /// The engine rejected the input.
    Tokenize(TokenizeError),
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Tokenize(err) => Some(err),
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read error: {err}"),
            Self::Tokenize(err) => write!(f, "{err}"),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TokenizeError> for StreamError {
    fn from(err: TokenizeError) -> Self {
        Self::Tokenize(err)
    }
}

/// Lazily tokenizes a [`Read`] source with a configured [`Tokenizer`].
///
/// ## Example
///
/// ```rust
/// use chunklex::tokenizer::{ChunkedTokenStream, json_tokenizer};
/// use std::io::Cursor;
///
/// let source = Cursor::new(r#"[1, 2]"#);
/// let stream = ChunkedTokenStream::new(json_tokenizer(), source);
/// let kinds: Vec<String> = stream
///     .map(|t| t.expect("valid JSON").kind.to_string())
///     .collect();
/// assert_eq!(kinds, ["begin-array", "number", "comma", "number", "end-array"]);
/// ```
pub struct ChunkedTokenStream<R> {
    reader: R,
    tokenizer: Tokenizer,
    chunk_size: usize,
    /// Tokens resolved but not yet yielded.
    ready: VecDeque<Token>,
    /// Error to yield once `ready` drains.
    pending_err: Option<StreamError>,
    /// Incomplete UTF-8 tail from the previous read.
    carry: Vec<u8>,
    done: bool,
}

impl<R: Read> ChunkedTokenStream<R> {
    /// Stream `reader` through `tokenizer` in [`DEFAULT_CHUNK_SIZE`] reads.
    pub fn new(tokenizer: Tokenizer, reader: R) -> Self {
        Self::with_chunk_size(tokenizer, reader, DEFAULT_CHUNK_SIZE)
    }

    /// Stream with an explicit read size (clamped to at least one byte).
    pub fn with_chunk_size(
        tokenizer: Tokenizer,
        reader: R,
        chunk_size: usize,
    ) -> Self {
        Self {
            reader,
            tokenizer,
            chunk_size: chunk_size.max(1),
            ready: VecDeque::new(),
            pending_err: None,
            carry: Vec::new(),
            done: false,
        }
    }

    /// Read and tokenize one more chunk, filling `ready`/`pending_err`.
    fn step(&mut self) {
        match self.read_chunk() {
            Ok(Some(text)) => {
                trace!("streamed {} decoded bytes", text.len());
                match self.tokenizer.push(&text) {
                    Ok(tokens) => self.ready.extend(tokens),
                    Err(err) => self.fail(err.into()),
                }
            }
            Ok(None) => {
                self.done = true;
                match self.tokenizer.end() {
                    Ok(tokens) => self.ready.extend(tokens),
                    Err(err) => self.fail(err.into()),
                }
            }
            Err(err) => self.fail(err),
        }
    }

    /// Queue a terminal error behind any tokens resolved before it.
    fn fail(&mut self, err: StreamError) {
        self.ready.extend(self.tokenizer.pending_tokens());
        self.pending_err = Some(err);
    }

    /// Pull the next chunk off the reader, prepending any held-back UTF-8
    /// tail. `Ok(None)` signals a clean end of input.
    fn read_chunk(&mut self) -> Result<Option<String>, StreamError> {
        let carried = self.carry.len();
        let mut buf = vec![0_u8; carried + self.chunk_size];
        buf[..carried].copy_from_slice(&self.carry);
        let n = self.reader.read(&mut buf[carried..])?;

        if n == 0 {
            if carried > 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "incomplete UTF-8 sequence at end of input",
                )
                .into());
            }
            return Ok(None);
        }

        self.carry.clear();
        let total = carried + n;
        let text = match std::str::from_utf8(&buf[..total]) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                // A scalar split by the read boundary; hold the tail back
                // for the next chunk.
                let valid = err.valid_up_to();
                self.carry.extend_from_slice(&buf[valid..total]);
                String::from_utf8_lossy(&buf[..valid]).into_owned()
            }
            Err(err) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid UTF-8 in input: {err}"),
                )
                .into());
            }
        };
        Ok(Some(text))
    }
}

impl<R: Read> Iterator for ChunkedTokenStream<R> {
    type Item = Result<Token, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.ready.pop_front() {
                return Some(Ok(token));
            }
            if let Some(err) = self.pending_err.take() {
                self.done = true;
                return Some(Err(err));
            }
            if self.done {
                return None;
            }
            self.step();
        }
    }
}
