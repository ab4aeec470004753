//! Escape sequence parser
//!
//! Splits escape-coded text into command blocks: an optional CSI control
//! sequence plus the plain text that follows it. Parsing is stateless and
//! the blocks partition the input exactly.

mod block;
mod lexer;

pub use block::{
    is_final_byte, is_parameter_byte, is_private_marker, CommandBlock, CSI_INTRODUCER, ESC,
};
pub use lexer::Blocks;

/// Error type for parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed escape sequence at offset {offset}: no terminator in {fragment:?}")]
    MalformedSequence { offset: usize, fragment: String },
}

/// Parse a buffer into its command blocks
pub fn parse(buffer: &str) -> Result<Vec<CommandBlock<'_>>, ParseError> {
    Blocks::new(buffer).collect()
}

/// Remove every control sequence, keeping only the plain text.
///
/// Stray ESC bytes are dropped as well so that the result parses as a
/// single text block.
pub fn strip(buffer: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(buffer.len());
    for block in Blocks::new(buffer) {
        let block = block?;
        if block.has_control_char {
            out.extend(block.text.chars().filter(|&c| c != char::from(ESC)));
        } else {
            out.push_str(block.text);
        }
    }
    Ok(out)
}

/// Number of chars in `buffer` that occupy a column when printed
pub fn printable_len(buffer: &str) -> Result<usize, ParseError> {
    Blocks::new(buffer).try_fold(0, |acc, block| Ok(acc + block?.printable_len()))
}

/// Rewrite the control sequences of a buffer.
///
/// `replace` is called for every block that carries a command. Returning
/// `Some(seq)` replaces the block's command prefix with `seq` (an empty
/// string drops it); `None` keeps the original. Text is always kept.
pub fn substitute<F>(buffer: &str, mut replace: F) -> Result<String, ParseError>
where
    F: FnMut(&CommandBlock<'_>) -> Option<String>,
{
    let mut out = String::with_capacity(buffer.len());
    for block in Blocks::new(buffer) {
        let block = block?;
        if block.command.is_some() {
            match replace(&block) {
                Some(seq) => out.push_str(&seq),
                None => out.push_str(block.command_prefix()),
            }
        }
        out.push_str(block.text);
    }
    Ok(out)
}

/// Find the block whose byte span contains `offset`
pub fn block_at<'a, 'b>(blocks: &'b [CommandBlock<'a>], offset: usize) -> Option<&'b CommandBlock<'a>> {
    let idx = blocks.partition_point(|b| b.block_end <= offset);
    blocks.get(idx).filter(|b| b.block_start <= offset)
}
