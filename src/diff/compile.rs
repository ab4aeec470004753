//! Chunk compilation
//!
//! Turns diff records into the text that must be rewritten. A running
//! balance tracks how far the new buffer has shifted relative to what is on
//! screen: unchanged text only needs rewriting while the balance is non
//! zero, since that is when it sits at a different offset than before.

use super::anchor::diff_chars;
use super::{DiffKind, DiffOptions, TextChunk, TextDiff, ERASE_CHAR};
use crate::parser::{self, ParseError};

/// A command block's span in char offsets
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    text_start: usize,
    end: usize,
    has_command: bool,
}

/// Compile the chunks that turn a screen showing `old` into `new`
pub fn compile_transformations(old: &str, new: &str) -> Result<Vec<TextChunk>, ParseError> {
    compile_transformations_with(old, new, &DiffOptions::default())
}

/// [`compile_transformations`] with explicit options
pub fn compile_transformations_with(old: &str, new: &str, options: &DiffOptions) -> Result<Vec<TextChunk>, ParseError> {
    let spans = command_spans(new)?;
    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();

    let diffs = diff_chars(&old, &new, options);
    let dirty = dirty_ranges(&diffs, old.len(), new.len());
    let dirty = merge(dirty.into_iter().map(|r| snap(r, &spans)).collect());

    let mut chunks = Vec::with_capacity(dirty.len() + 1);
    let mut written_to = 0;
    for (start, end) in dirty {
        if let Some(span) = span_at(&spans, start) {
            // Re-assert the style of the block this range starts in
            if span.has_command && start >= span.text_start && written_to <= span.start {
                chunks.push(TextChunk::new(span.start, collect(&new[span.start..span.text_start])));
            }
        }
        chunks.push(TextChunk::new(start, collect(&new[start..end])));
        written_to = end;
    }

    if old.len() > new.len() {
        let erase: String = std::iter::repeat(ERASE_CHAR).take(old.len() - new.len()).collect();
        chunks.push(TextChunk::new(new.len(), erase));
    }

    tracing::trace!(diffs = diffs.len(), chunks = chunks.len(), "compiled transformations");
    Ok(chunks)
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Ranges of the new buffer that differ from what is on screen
fn dirty_ranges(diffs: &[TextDiff], old_len: usize, new_len: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    let mut balance: isize = 0;

    for diff in diffs {
        let common = match diff.kind {
            DiffKind::Removal => diff.start - i,
            DiffKind::Insertion | DiffKind::Mutation => diff.start - j,
        };
        if common > 0 && balance != 0 {
            ranges.push((j, j + common));
        }
        i += common;
        j += common;

        match diff.kind {
            DiffKind::Insertion => {
                ranges.push((j, j + diff.len()));
                j += diff.len();
                balance += diff.len() as isize;
            }
            DiffKind::Removal => {
                i += diff.len();
                balance -= diff.len() as isize;
            }
            DiffKind::Mutation => {
                ranges.push((j, j + diff.len()));
                i += diff.len();
                j += diff.len();
            }
        }
    }

    debug_assert_eq!(old_len - i, new_len - j);
    if j < new_len && balance != 0 {
        ranges.push((j, new_len));
    }
    ranges
}

/// Command spans of `buffer` converted to char offsets
fn command_spans(buffer: &str) -> Result<Vec<Span>, ParseError> {
    let blocks = parser::parse(buffer)?;
    let mut spans = Vec::with_capacity(blocks.len());
    let mut chars = 0;
    for block in &blocks {
        let start = chars;
        let text_start = start + block.command_prefix().chars().count();
        let end = text_start + block.text.chars().count();
        spans.push(Span {
            start,
            text_start,
            end,
            has_command: block.command.is_some(),
        });
        chars = end;
    }
    Ok(spans)
}

fn span_at(spans: &[Span], offset: usize) -> Option<&Span> {
    let idx = spans.partition_point(|s| s.end <= offset);
    spans.get(idx).filter(|s| s.start <= offset)
}

/// Widen a range so it never starts or ends inside a command
fn snap((mut start, mut end): (usize, usize), spans: &[Span]) -> (usize, usize) {
    if let Some(span) = span_at(spans, start) {
        if span.has_command && start < span.text_start {
            start = span.start;
        }
    }
    if end > start {
        if let Some(span) = span_at(spans, end - 1) {
            if span.has_command && end - 1 < span.text_start {
                end = span.text_start;
            }
        }
    }
    (start, end)
}

/// Sort and join overlapping or touching ranges
fn merge(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.retain(|(s, e)| e > s);
    ranges.sort_unstable();
    let mut out: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (s, e) in ranges {
        match out.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => out.push((s, e)),
        }
    }
    out
}
