//! Text diff engine
//!
//! Compares the text currently on screen with the text that should be
//! there and produces the chunks that need rewriting. Offsets are char
//! (code point) indices.

mod anchor;
mod compile;

pub use anchor::{anchor_len, difference, difference_with};
pub use compile::{compile_transformations, compile_transformations_with};

use serde::{Deserialize, Serialize};

/// Scan length at which the insertion and removal scans run on two threads
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 2048;

/// Chars written to blank stale text past the end of a shorter buffer
pub const ERASE_CHAR: char = ' ';

/// Classification of a divergent range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// Text present only in the new buffer
    Insertion,
    /// Text present only in the old buffer
    Removal,
    /// Text altered in place with the same length
    Mutation,
}

/// A divergent range.
///
/// `Insertion` and `Mutation` ranges index the new buffer, `Removal`
/// ranges index the old buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextDiff {
    pub kind: DiffKind,
    pub start: usize,
    pub end: usize,
}

impl TextDiff {
    pub fn new(kind: DiffKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Text to write at an offset of the new buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextChunk {
    pub offset: usize,
    pub text: String,
}

impl TextChunk {
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }

    /// Whether this chunk blanks text past the end of a buffer of `len` chars
    pub fn is_erase(&self, len: usize) -> bool {
        self.offset >= len
    }
}

/// Tuning for the diff engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub parallel_threshold: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Apply chunks to a buffer showing `old`, overwriting char by char.
///
/// Writing past the end extends the buffer, padding gaps with blanks.
pub fn apply_chunks(old: &str, chunks: &[TextChunk]) -> String {
    let mut buf: Vec<char> = old.chars().collect();
    for chunk in chunks {
        for (k, ch) in chunk.text.chars().enumerate() {
            let pos = chunk.offset + k;
            if pos >= buf.len() {
                buf.resize(pos, ERASE_CHAR);
                buf.push(ch);
            } else {
                buf[pos] = ch;
            }
        }
    }
    buf.into_iter().collect()
}
